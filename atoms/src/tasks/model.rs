use serde::{Deserialize, Serialize};

/// Task domain model - one card on the board
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub task_id: String,
    pub title: String,
    pub description: String,

    /// Free-text progress notes attached by the assignee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    pub assigned_to: String,
    pub assigned_by: String,

    /// "Todo" | "In Progress" | "Completed"; always written together with
    /// progress (0 <=> Todo, 100 <=> Completed, anything between <=> In Progress)
    pub status: String,
    pub progress: u8,

    /// Display/sorting only, never enforced
    pub deadline: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub deadline: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub documentation: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<String>,
    pub progress: Option<u8>,
    pub deadline: Option<String>,
}
