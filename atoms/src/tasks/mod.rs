// HTTP handlers for tasks live in the kanban-board crate, which owns the
// status/progress rules; this atom is model + persistence only.
pub mod model;
pub mod service;

pub use model::{CreateTaskPayload, Task, UpdateTaskPayload};
pub use service::*;
