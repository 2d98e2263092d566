use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_role: String, // "Admin" | "TeamLeader" | "Employee"

    /// "IT" | "Finance" | "Sales" | "Customer-Service"; Admins carry none
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,
    pub skill_level: Option<String>, // "Beginner" | "Intermediate" | "Advanced"
    pub experience_years: Option<u32>,
    pub description: Option<String>,

    pub is_active: bool,
    pub user_created_at: String,
    pub user_last_login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub user_name: String,
    pub user_email: String,
    pub user_role: String,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub skill_level: Option<String>,
    pub experience_years: Option<u32>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub skills: Option<Vec<String>>,
    pub skill_level: Option<String>,
    pub experience_years: Option<u32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
