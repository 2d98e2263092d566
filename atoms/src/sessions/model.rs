use serde::{Deserialize, Serialize};

/// One login event, kept for the admin audit view
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginSession {
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub login_time: String,
    pub logout_time: Option<String>,
    pub active: bool,
}
