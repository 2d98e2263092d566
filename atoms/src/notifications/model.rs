use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub notification_id: String,

    /// "Message" | "Task" | "Announcement" | "System"
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub sender_id: String,

    /// Directed at one user, a whole department, or (both None) everyone
    pub recipient_id: Option<String>,
    pub department: Option<String>,

    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub recipient_id: Option<String>,
    pub department: Option<String>,
}
