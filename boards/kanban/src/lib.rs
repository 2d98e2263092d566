//! The task board: three status columns over a flat task list, plus the two
//! ways a card moves between them (drag gestures and the progress dialog).
//! Everything in `board`/`dialog`/`status` is pure and synchronous; the only
//! I/O lives in `tasks`, the HTTP layer that persists board writes.

pub mod board;
pub mod dialog;
pub mod status;
pub mod tasks;

pub use board::{ApplyResult, EditSink, PersistError, TaskBoard};
pub use dialog::ProgressDialog;
pub use status::{progress_for_status, status_for_progress, TaskStatus};
