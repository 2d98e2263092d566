pub mod http;
pub mod model;
pub mod service;

pub use model::{CreateUserPayload, UpdateUserPayload, User};
pub use service::*;
