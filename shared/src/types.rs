// One import surface for the wire types the frontend sees.

// ========== USER ==========
pub use hrhub_atoms::users::model::{CreateUserPayload, UpdateUserPayload, User};

// ========== TASK ==========
pub use hrhub_atoms::tasks::model::{CreateTaskPayload, Task, UpdateTaskPayload};

// ========== COURSE ==========
pub use hrhub_atoms::courses::model::{
    Course, CreateCoursePayload, Enrollment, UpdateEnrollmentPayload,
};

// ========== NOTIFICATION ==========
pub use hrhub_atoms::notifications::model::{CreateNotificationPayload, Notification};

// ========== SESSION ==========
pub use hrhub_atoms::sessions::model::LoginSession;
