pub mod http;
pub mod model;
pub mod service;

pub use model::{Course, CreateCoursePayload, Enrollment, UpdateEnrollmentPayload};
pub use service::*;
