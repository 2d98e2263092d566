use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Course {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub department: String,
    pub video_url: String,
    pub thumbnail: Option<String>,
    pub enrolled_count: u32,
    pub created_at: String,
}

/// One user's progress through one course
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Enrollment {
    pub course_id: String,
    pub user_id: String,
    pub progress: u8,
    pub status: String, // "Not Started" | "In Progress" | "Completed"
    pub enrolled_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCoursePayload {
    pub title: String,
    pub description: String,
    pub department: String,
    pub video_url: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEnrollmentPayload {
    pub progress: u8,
}
