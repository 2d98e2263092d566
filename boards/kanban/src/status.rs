use std::fmt;

/// The three board columns. Task status travels as a plain string on the
/// wire ("Todo" | "In Progress" | "Completed"); it is parsed into this enum
/// at the board boundary and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "Todo" => Some(TaskStatus::Todo),
            "In Progress" => Some(TaskStatus::InProgress),
            "Completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage -> column. 0 is Todo, 100 is Completed, anything between is
/// In Progress. Both update paths derive status through this single rule so
/// status and progress can never drift apart.
pub fn status_for_progress(progress: u8) -> TaskStatus {
    match progress {
        0 => TaskStatus::Todo,
        100.. => TaskStatus::Completed,
        _ => TaskStatus::InProgress,
    }
}

/// Column -> default percentage for coarse drag moves. A drop target only
/// encodes lifecycle state, so the midpoint stands in until the assignee
/// refines it through the dialog.
pub fn progress_for_status(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 50,
        TaskStatus::Completed => 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_wire_strings() {
        assert_eq!(TaskStatus::parse("Todo"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("Completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("completed"), None);
        assert_eq!(TaskStatus::parse("Done"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }

    #[test]
    fn round_trips_through_as_str() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn derives_status_from_every_percentage() {
        assert_eq!(status_for_progress(0), TaskStatus::Todo);
        for p in 1..100 {
            assert_eq!(status_for_progress(p), TaskStatus::InProgress, "p = {}", p);
        }
        assert_eq!(status_for_progress(100), TaskStatus::Completed);
    }

    #[test]
    fn drag_defaults_are_fixed() {
        assert_eq!(progress_for_status(TaskStatus::Todo), 0);
        assert_eq!(progress_for_status(TaskStatus::InProgress), 50);
        assert_eq!(progress_for_status(TaskStatus::Completed), 100);
    }

    #[test]
    fn drag_default_lands_in_its_own_column() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(status_for_progress(progress_for_status(status)), status);
        }
    }
}
