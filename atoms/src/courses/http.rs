use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateCoursePayload, UpdateEnrollmentPayload};
use super::service;
use crate::users::model::User;

fn json_error(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(
            serde_json::json!({ "error": message })
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

fn json_ok<T: serde::Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

/// GET /courses — Admin sees the whole catalog, everyone else their department
pub async fn list_courses(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    let courses = service::load_courses(client, table_name).await?;

    let visible: Vec<_> = if actor.user_role == "Admin" {
        courses
    } else {
        courses
            .into_iter()
            .filter(|c| Some(&c.department) == actor.department.as_ref())
            .collect()
    };

    json_ok(StatusCode::OK, &visible)
}

/// POST /courses — Admin or TeamLeader
pub async fn create_course_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" && actor.user_role != "TeamLeader" {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }

    let payload: CreateCoursePayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    let course = service::create_course(client, table_name, payload).await?;
    json_ok(StatusCode::CREATED, &course)
}

/// POST /courses/{id}/enroll — enroll the caller; a second enroll is a 409
/// so an existing enrollment's progress is never reset
pub async fn enroll_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    course_id: &str,
) -> Result<Response<Body>, Error> {
    if service::get_course(client, table_name, course_id)
        .await?
        .is_none()
    {
        return json_error(StatusCode::NOT_FOUND, "Course not found");
    }

    if service::get_enrollment(client, table_name, &actor.user_id, course_id)
        .await?
        .is_some()
    {
        return json_error(StatusCode::CONFLICT, "Already enrolled");
    }

    let enrollment = service::enroll(client, table_name, &actor.user_id, course_id).await?;
    tracing::info!("User {} enrolled in course {}", actor.user_id, course_id);
    json_ok(StatusCode::CREATED, &enrollment)
}

/// PATCH /courses/{id}/progress — caller updates their own enrollment;
/// status derives from progress exactly like the task board rule
pub async fn update_progress_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    course_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateEnrollmentPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    if payload.progress > 100 {
        return json_error(StatusCode::BAD_REQUEST, "Progress must be 0-100");
    }

    if service::get_enrollment(client, table_name, &actor.user_id, course_id)
        .await?
        .is_none()
    {
        return json_error(StatusCode::NOT_FOUND, "Not enrolled in this course");
    }

    let enrollment = service::set_enrollment_progress(
        client,
        table_name,
        &actor.user_id,
        course_id,
        payload.progress,
    )
    .await?;

    json_ok(StatusCode::OK, &enrollment)
}

/// GET /courses/enrollments — the caller's own enrollments
pub async fn list_my_enrollments(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    let enrollments = service::load_enrollments(client, table_name, &actor.user_id).await?;
    json_ok(StatusCode::OK, &enrollments)
}
