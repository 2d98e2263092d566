pub mod courses;
pub mod notifications;
pub mod sessions;
pub mod tasks;
pub mod users;
