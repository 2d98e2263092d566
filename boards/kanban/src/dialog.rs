use hrhub_atoms::tasks::model::Task;

use crate::board::{ApplyResult, EditSink, TaskBoard};
use crate::status::status_for_progress;

const STEP: u8 = 5;

/// The fine-grained alternative to dragging: pick an exact percentage (in
/// steps of five) and attach progress notes. Status is derived from the
/// percentage on confirm; the dialog never sets it directly.
///
/// Dropping the dialog without calling `confirm` is cancel - no callback,
/// no board change.
pub struct ProgressDialog {
    task_id: String,
    progress: u8,
    notes: String,
}

impl ProgressDialog {
    /// Seed the editable fields from the task's current values.
    pub fn open(task: &Task) -> Self {
        ProgressDialog {
            task_id: task.task_id.clone(),
            progress: task.progress,
            notes: task.documentation.clone().unwrap_or_default(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Snap to the nearest multiple of five, clamped to 0-100; the slider
    /// control only produces stepped values, so the model does too.
    pub fn set_progress(&mut self, value: u8) {
        let clamped = value.min(100);
        let snapped = ((clamped as u16 + STEP as u16 / 2) / STEP as u16) * STEP as u16;
        self.progress = (snapped as u8).min(100);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Commit: progress as chosen, status derived, notes verbatim. Moves the
    /// card between columns when the derived status differs, pushes exactly
    /// one edit through the sink, and reverts everything if the sink refuses.
    pub fn confirm(self, board: &mut TaskBoard, sink: &mut dyn EditSink) -> ApplyResult {
        let status = status_for_progress(self.progress);
        board.apply_and_persist(
            &self.task_id,
            status,
            self.progress,
            Some(&self.notes),
            sink,
        )
    }

    /// Discard all edits. Equivalent to dropping the dialog; spelled out for
    /// call sites that want the intent visible.
    pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PersistError;
    use crate::status::TaskStatus;

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

    struct RecordingSink {
        edits: Vec<Task>,
        fail: bool,
    }

    impl EditSink for RecordingSink {
        fn on_edit(&mut self, task: &Task) -> Result<(), PersistError> {
            self.edits.push(task.clone());
            if self.fail {
                Err(PersistError("rejected".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn sink() -> RecordingSink {
        RecordingSink {
            edits: Vec::new(),
            fail: false,
        }
    }

    #[test]
    fn seeds_from_the_task() {
        let mut t = task("a", "In Progress", 40);
        t.documentation = Some("halfway there".to_string());

        let dialog = ProgressDialog::open(&t);
        assert_eq!(dialog.progress(), 40);
        assert_eq!(dialog.notes(), "halfway there");

        let fresh = ProgressDialog::open(&task("b", "Todo", 0));
        assert_eq!(fresh.progress(), 0);
        assert_eq!(fresh.notes(), "");
    }

    #[test]
    fn progress_snaps_to_steps_of_five() {
        let mut dialog = ProgressDialog::open(&task("a", "Todo", 0));

        dialog.set_progress(42);
        assert_eq!(dialog.progress(), 40);
        dialog.set_progress(43);
        assert_eq!(dialog.progress(), 45);
        dialog.set_progress(98);
        assert_eq!(dialog.progress(), 100);
        dialog.set_progress(255);
        assert_eq!(dialog.progress(), 100);
        dialog.set_progress(0);
        assert_eq!(dialog.progress(), 0);
    }

    #[test]
    fn derived_status_matches_the_percentage_rule() {
        for (p, expected) in [
            (0, TaskStatus::Todo),
            (5, TaskStatus::InProgress),
            (95, TaskStatus::InProgress),
            (100, TaskStatus::Completed),
        ] {
            let mut board = TaskBoard::new(vec![task("a", "In Progress", 40)]);
            let mut s = sink();
            let mut dialog = ProgressDialog::open(&task("a", "In Progress", 40));
            dialog.set_progress(p);

            match dialog.confirm(&mut board, &mut s) {
                ApplyResult::Applied(t) => {
                    assert_eq!(t.progress, p);
                    assert_eq!(t.status, expected.as_str());
                    assert_eq!(board.column(expected).len(), 1);
                }
                other => panic!("expected Applied for p={}, got {:?}", p, other),
            }
        }
    }

    #[test]
    fn confirm_moves_the_card_and_calls_the_sink_once() {
        // In Progress at 40 pushed to done with notes
        let t2 = task("t2", "In Progress", 40);
        let mut board = TaskBoard::new(vec![t2.clone()]);
        let mut s = sink();

        let mut dialog = ProgressDialog::open(&t2);
        dialog.set_progress(100);
        dialog.set_notes("done");
        let result = dialog.confirm(&mut board, &mut s);

        let updated = match result {
            ApplyResult::Applied(t) => t,
            other => panic!("expected Applied, got {:?}", other),
        };
        assert_eq!(updated.status, "Completed");
        assert_eq!(updated.progress, 100);
        assert_eq!(updated.documentation.as_deref(), Some("done"));
        assert!(board.in_progress().is_empty());
        assert_eq!(board.completed()[0].task_id, "t2");
        assert_eq!(s.edits.len(), 1);
        assert_eq!(s.edits[0], updated);
    }

    #[test]
    fn confirm_without_a_column_change_updates_in_place() {
        let mut board = TaskBoard::new(vec![
            task("a", "In Progress", 20),
            task("b", "In Progress", 60),
        ]);
        let mut s = sink();

        let mut dialog = ProgressDialog::open(board.find("a").map(|(t, _)| t).unwrap());
        dialog.set_progress(35);
        dialog.confirm(&mut board, &mut s);

        // still in the same column, same position
        assert_eq!(board.in_progress()[0].task_id, "a");
        assert_eq!(board.in_progress()[0].progress, 35);
        assert_eq!(s.edits.len(), 1);
    }

    #[test]
    fn cancel_touches_nothing() {
        let t = task("a", "Todo", 0);
        let mut board = TaskBoard::new(vec![t.clone()]);

        let mut dialog = ProgressDialog::open(&t);
        dialog.set_progress(80);
        dialog.set_notes("scratch");
        dialog.cancel();

        assert_eq!(board.todo()[0], t);
        // a fresh dialog re-seeds from the untouched task
        let reopened = ProgressDialog::open(board.find("a").map(|(t, _)| t).unwrap());
        assert_eq!(reopened.progress(), 0);
        assert_eq!(reopened.notes(), "");
    }

    #[test]
    fn rejected_confirm_rolls_the_card_back() {
        let t = task("a", "In Progress", 40);
        let mut board = TaskBoard::new(vec![t.clone()]);
        let mut s = RecordingSink {
            edits: Vec::new(),
            fail: true,
        };

        let mut dialog = ProgressDialog::open(&t);
        dialog.set_progress(100);
        dialog.set_notes("done");
        let result = dialog.confirm(&mut board, &mut s);

        assert!(matches!(result, ApplyResult::RolledBack(_)));
        assert!(board.completed().is_empty());
        assert_eq!(board.in_progress()[0], t);
    }

    #[test]
    fn notes_are_kept_verbatim() {
        let t = task("a", "Todo", 0);
        let mut board = TaskBoard::new(vec![t.clone()]);
        let mut s = sink();

        let mut dialog = ProgressDialog::open(&t);
        dialog.set_notes("  leading and trailing  ");
        dialog.set_progress(5);

        match dialog.confirm(&mut board, &mut s) {
            ApplyResult::Applied(updated) => {
                assert_eq!(
                    updated.documentation.as_deref(),
                    Some("  leading and trailing  ")
                );
            }
            other => panic!("expected Applied, got {:?}", other),
        }
    }
}
