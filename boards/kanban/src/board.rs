use std::fmt;

use hrhub_atoms::tasks::model::Task;

use crate::status::{progress_for_status, TaskStatus};

/// The persistence callback reported a failure; the local move that
/// triggered it has been reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistError(pub String);

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "persist failed: {}", self.0)
    }
}

impl std::error::Error for PersistError {}

/// Upstream write channel. The board mutates its columns first and pushes
/// the updated task through this seam; whoever owns persistence decides
/// whether the write stuck.
pub trait EditSink {
    fn on_edit(&mut self, task: &Task) -> Result<(), PersistError>;
}

impl<F> EditSink for F
where
    F: FnMut(&Task) -> Result<(), PersistError>,
{
    fn on_edit(&mut self, task: &Task) -> Result<(), PersistError> {
        self(task)
    }
}

/// What a board update did.
#[derive(Debug)]
pub enum ApplyResult {
    /// Columns updated and the sink accepted the write.
    Applied(Task),
    /// Nothing to do (card dropped back onto its own column).
    Unchanged,
    /// The task id was not where the gesture claimed; stale payloads are
    /// skipped rather than surfaced.
    NotFound,
    /// The sink rejected the write and the column move was reverted.
    RolledBack(PersistError),
}

struct Move {
    updated: Task,
    prior: Task,
    from: TaskStatus,
    to: TaskStatus,
    index: usize,
}

/// Three ordered columns derived from a flat task list. The backend stays
/// the source of truth: build one with `new` from a fresh fetch, mutate it
/// through `handle_drop` / `ProgressDialog::confirm`, rebuild with `reload`
/// whenever the upstream list changes.
pub struct TaskBoard {
    todo: Vec<Task>,
    in_progress: Vec<Task>,
    completed: Vec<Task>,
    skipped: Vec<String>,
}

impl TaskBoard {
    /// Partition tasks by status, preserving input order within each column.
    /// A task whose status string does not parse lands in no column; it is
    /// logged and its id kept so callers can surface the exclusion.
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut board = TaskBoard {
            todo: Vec::new(),
            in_progress: Vec::new(),
            completed: Vec::new(),
            skipped: Vec::new(),
        };

        for task in tasks {
            match TaskStatus::parse(&task.status) {
                Some(status) => board.column_mut(status).push(task),
                None => {
                    tracing::warn!(
                        "Task {} has unrecognized status {:?}, excluded from the board",
                        task.task_id,
                        task.status
                    );
                    board.skipped.push(task.task_id);
                }
            }
        }

        board
    }

    pub fn reload(&mut self, tasks: Vec<Task>) {
        *self = TaskBoard::new(tasks);
    }

    pub fn todo(&self) -> &[Task] {
        &self.todo
    }

    pub fn in_progress(&self) -> &[Task] {
        &self.in_progress
    }

    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    /// Ids of tasks excluded at partition time for an unparseable status.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Completed => &self.completed,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, task_id: &str) -> Option<(&Task, TaskStatus)> {
        let (status, index) = self.locate(task_id)?;
        Some((&self.column(status)[index], status))
    }

    fn locate(&self, task_id: &str) -> Option<(TaskStatus, usize)> {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed] {
            if let Some(index) = self
                .column(status)
                .iter()
                .position(|t| t.task_id == task_id)
            {
                return Some((status, index));
            }
        }
        None
    }

    /// The one move primitive both update paths go through: set status and
    /// progress together (plus notes when the dialog supplies them) and keep
    /// the columns consistent with the new status.
    fn apply_move(
        &mut self,
        task_id: &str,
        new_status: TaskStatus,
        new_progress: u8,
        notes: Option<&str>,
    ) -> Option<Move> {
        let (from, index) = self.locate(task_id)?;
        let prior = self.column(from)[index].clone();

        let mut updated = prior.clone();
        updated.status = new_status.as_str().to_string();
        updated.progress = new_progress;
        if let Some(notes) = notes {
            updated.documentation = Some(notes.to_string());
        }

        if from == new_status {
            self.column_mut(from)[index] = updated.clone();
        } else {
            self.column_mut(from).remove(index);
            self.column_mut(new_status).push(updated.clone());
        }

        Some(Move {
            updated,
            prior,
            from,
            to: new_status,
            index,
        })
    }

    fn undo_move(&mut self, mv: Move) {
        if mv.from == mv.to {
            self.column_mut(mv.from)[mv.index] = mv.prior;
            return;
        }
        if let Some(pos) = self
            .column(mv.to)
            .iter()
            .position(|t| t.task_id == mv.updated.task_id)
        {
            self.column_mut(mv.to).remove(pos);
        }
        let column = self.column_mut(mv.from);
        let index = mv.index.min(column.len());
        column.insert(index, mv.prior);
    }

    /// Move a card, hand the updated task to the sink, and revert the move
    /// if the sink refuses it. Exactly one `on_edit` call per applied move.
    pub(crate) fn apply_and_persist(
        &mut self,
        task_id: &str,
        new_status: TaskStatus,
        new_progress: u8,
        notes: Option<&str>,
        sink: &mut dyn EditSink,
    ) -> ApplyResult {
        let mv = match self.apply_move(task_id, new_status, new_progress, notes) {
            Some(mv) => mv,
            None => return ApplyResult::NotFound,
        };

        match sink.on_edit(&mv.updated) {
            Ok(()) => ApplyResult::Applied(mv.updated.clone()),
            Err(e) => {
                tracing::warn!(
                    "Persist failed for task {}, reverting local move: {}",
                    task_id,
                    e
                );
                self.undo_move(mv);
                ApplyResult::RolledBack(e)
            }
        }
    }

    /// A drag gesture: the card left `source` and was dropped on `target`.
    /// Progress is coarse here - the target column's fixed default - because
    /// a drop only encodes lifecycle state.
    pub fn handle_drop(
        &mut self,
        task_id: &str,
        source: TaskStatus,
        target: TaskStatus,
        sink: &mut dyn EditSink,
    ) -> ApplyResult {
        if source == target {
            return ApplyResult::Unchanged;
        }

        // Trust the gesture payload only as far as it matches reality: the
        // card has to actually sit in the claimed source column.
        if !self
            .column(source)
            .iter()
            .any(|t| t.task_id == task_id)
        {
            return ApplyResult::NotFound;
        }

        self.apply_and_persist(task_id, target, progress_for_status(target), None, sink)
    }

    /// Caller-side reconciliation after an external delete succeeds. The
    /// board never initiates deletion and fires no callback here.
    pub fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        let (status, index) = self.locate(task_id)?;
        Some(self.column_mut(status).remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str, progress: u8) -> Task {
        Task {
            task_id: id.to_string(),
            title: format!("task {}", id),
            description: String::new(),
            documentation: None,
            assigned_to: "emp-1".to_string(),
            assigned_by: "lead-1".to_string(),
            status: status.to_string(),
            progress,
            deadline: "2026-09-30T00:00:00Z".to_string(),
            created_at: "2026-08-01T00:00:00Z".to_string(),
        }
    }

    /// Records every edit it sees; optionally refuses them all.
    struct RecordingSink {
        edits: Vec<Task>,
        fail: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            RecordingSink {
                edits: Vec::new(),
                fail: false,
            }
        }

        fn failing() -> Self {
            RecordingSink {
                edits: Vec::new(),
                fail: true,
            }
        }
    }

    impl EditSink for RecordingSink {
        fn on_edit(&mut self, task: &Task) -> Result<(), PersistError> {
            self.edits.push(task.clone());
            if self.fail {
                Err(PersistError("backend unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.task_id.as_str()).collect()
    }

    #[test]
    fn partitions_every_valid_task_exactly_once() {
        let board = TaskBoard::new(vec![
            task("a", "Todo", 0),
            task("b", "In Progress", 40),
            task("c", "Completed", 100),
            task("d", "Todo", 0),
            task("e", "In Progress", 75),
        ]);

        assert_eq!(ids(board.todo()), vec!["a", "d"]);
        assert_eq!(ids(board.in_progress()), vec!["b", "e"]);
        assert_eq!(ids(board.completed()), vec!["c"]);
        assert_eq!(board.len(), 5);
        assert!(board.skipped().is_empty());
    }

    #[test]
    fn excludes_unrecognized_status_and_says_so() {
        let board = TaskBoard::new(vec![
            task("a", "Todo", 0),
            task("b", "Archived", 10),
            task("c", "todo", 0), // case matters on the wire
        ]);

        assert_eq!(board.len(), 1);
        assert_eq!(board.skipped(), &["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn same_column_drop_is_a_complete_noop() {
        let mut board = TaskBoard::new(vec![task("a", "Todo", 0), task("b", "Todo", 0)]);
        let mut sink = RecordingSink::new();

        let result = board.handle_drop("a", TaskStatus::Todo, TaskStatus::Todo, &mut sink);

        assert!(matches!(result, ApplyResult::Unchanged));
        assert!(sink.edits.is_empty());
        assert_eq!(ids(board.todo()), vec!["a", "b"]);
    }

    #[test]
    fn drag_to_completed_forces_progress_100() {
        let mut board = TaskBoard::new(vec![task("t1", "Todo", 0)]);
        let mut sink = RecordingSink::new();

        let result = board.handle_drop("t1", TaskStatus::Todo, TaskStatus::Completed, &mut sink);

        let updated = match result {
            ApplyResult::Applied(t) => t,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(updated.status, "Completed");
        assert_eq!(updated.progress, 100);
        assert!(board.todo().is_empty());
        assert_eq!(ids(board.completed()), vec!["t1"]);
        assert_eq!(sink.edits.len(), 1);
        assert_eq!(sink.edits[0], updated);
    }

    #[test]
    fn drag_mapping_ignores_prior_progress() {
        // Completed task dragged all the way back to Todo: reachable, legal,
        // progress resets to the column default.
        let mut board = TaskBoard::new(vec![task("a", "Completed", 100)]);
        let mut sink = RecordingSink::new();

        board.handle_drop("a", TaskStatus::Completed, TaskStatus::Todo, &mut sink);
        assert_eq!(board.todo()[0].progress, 0);
        assert_eq!(board.todo()[0].status, "Todo");

        board.handle_drop("a", TaskStatus::Todo, TaskStatus::InProgress, &mut sink);
        assert_eq!(board.in_progress()[0].progress, 50);
        assert_eq!(sink.edits.len(), 2);
    }

    #[test]
    fn dropped_card_appends_to_the_target_column() {
        let mut board = TaskBoard::new(vec![
            task("a", "In Progress", 20),
            task("b", "Todo", 0),
        ]);
        let mut sink = RecordingSink::new();

        board.handle_drop("b", TaskStatus::Todo, TaskStatus::InProgress, &mut sink);

        assert_eq!(ids(board.in_progress()), vec!["a", "b"]);
    }

    #[test]
    fn stale_drag_payload_is_skipped() {
        let mut board = TaskBoard::new(vec![task("a", "Todo", 0)]);
        let mut sink = RecordingSink::new();

        let result = board.handle_drop("ghost", TaskStatus::Todo, TaskStatus::Completed, &mut sink);

        assert!(matches!(result, ApplyResult::NotFound));
        assert!(sink.edits.is_empty());
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn drag_claiming_the_wrong_source_column_is_skipped() {
        let mut board = TaskBoard::new(vec![task("a", "In Progress", 50)]);
        let mut sink = RecordingSink::new();

        let result = board.handle_drop("a", TaskStatus::Todo, TaskStatus::Completed, &mut sink);

        assert!(matches!(result, ApplyResult::NotFound));
        assert!(sink.edits.is_empty());
        assert_eq!(ids(board.in_progress()), vec!["a"]);
    }

    #[test]
    fn rejected_persist_reverts_the_move_in_place() {
        let mut board = TaskBoard::new(vec![
            task("a", "Todo", 0),
            task("b", "Todo", 0),
            task("c", "Todo", 0),
        ]);
        let mut sink = RecordingSink::failing();

        let result = board.handle_drop("b", TaskStatus::Todo, TaskStatus::Completed, &mut sink);

        assert!(matches!(result, ApplyResult::RolledBack(_)));
        assert_eq!(sink.edits.len(), 1); // the write was attempted once
        // b is back where it was, untouched
        assert_eq!(ids(board.todo()), vec!["a", "b", "c"]);
        assert_eq!(board.todo()[1].progress, 0);
        assert_eq!(board.todo()[1].status, "Todo");
        assert!(board.completed().is_empty());
    }

    #[test]
    fn remove_task_fires_no_callback() {
        let mut board = TaskBoard::new(vec![task("a", "Todo", 0), task("b", "Completed", 100)]);

        let removed = board.remove_task("b");

        assert_eq!(removed.map(|t| t.task_id), Some("b".to_string()));
        assert!(board.remove_task("b").is_none());
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn reload_rebuilds_from_the_fresh_list() {
        let mut board = TaskBoard::new(vec![task("a", "Todo", 0)]);
        board.reload(vec![task("x", "Completed", 100), task("y", "Todo", 0)]);

        assert_eq!(ids(board.todo()), vec!["y"]);
        assert_eq!(ids(board.completed()), vec!["x"]);
        assert!(board.find("a").is_none());
    }
}
