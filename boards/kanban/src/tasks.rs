use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use std::collections::HashMap;

use hrhub_atoms::tasks::model::{CreateTaskPayload, Task, UpdateTaskPayload};
use hrhub_atoms::tasks::service;
use hrhub_atoms::users;
use hrhub_atoms::users::model::User;

use crate::status::{progress_for_status, status_for_progress, TaskStatus};

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

/// Status and progress always move together. Whichever field the client
/// sends, the other is derived: an explicit percentage wins and dictates the
/// column; a bare status (a drag persisted by a thin client) gets the
/// column's coarse default percentage.
fn normalize_status_progress(mut payload: UpdateTaskPayload) -> Result<UpdateTaskPayload, String> {
    if let Some(progress) = payload.progress {
        if progress > 100 {
            return Err("Progress must be 0-100".to_string());
        }
        payload.status = Some(status_for_progress(progress).as_str().to_string());
    } else if let Some(status) = &payload.status {
        match TaskStatus::parse(status) {
            Some(parsed) => payload.progress = Some(progress_for_status(parsed)),
            None => return Err(format!("Unknown status {:?}", status)),
        }
    }
    Ok(payload)
}

fn can_touch(task: &Task, actor: &User) -> bool {
    actor.user_role == "Admin"
        || task.assigned_to == actor.user_id
        || task.assigned_by == actor.user_id
}

/// GET /tasks — Admin sees everything, a TeamLeader their department's
/// board, an Employee their own cards
pub async fn list_tasks(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    let visible: Vec<Task> = match actor.user_role.as_str() {
        "Admin" => service::load_tasks(client, table_name).await?,
        "TeamLeader" => {
            // Department scoping needs the directory: join tasks against
            // each assignee's department.
            let (tasks, directory) = tokio::join!(
                service::load_tasks(client, table_name),
                users::load_users(client, table_name)
            );
            let tasks = tasks?;
            let directory = directory?;

            let departments: HashMap<&str, &Option<String>> = directory
                .iter()
                .map(|u| (u.user_id.as_str(), &u.department))
                .collect();

            tasks
                .into_iter()
                .filter(|t| {
                    departments
                        .get(t.assigned_to.as_str())
                        .is_some_and(|dept| **dept == actor.department)
                })
                .collect()
        }
        _ => service::load_tasks(client, table_name)
            .await?
            .into_iter()
            .filter(|t| t.assigned_to == actor.user_id)
            .collect(),
    };

    json_ok(StatusCode::OK, &visible)
}

pub async fn get_task_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_task(client, table_name, task_id).await? {
        Some(task) if can_touch(&task, actor) => json_ok(StatusCode::OK, &task),
        Some(_) => json_error(StatusCode::FORBIDDEN, "Forbidden"),
        None => json_error(StatusCode::NOT_FOUND, "Task not found"),
    }
}

/// POST /tasks — Admin or TeamLeader assigns; TeamLeaders only within their
/// own department. New cards always enter at Todo / 0.
pub async fn create_task_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" && actor.user_role != "TeamLeader" {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }

    let payload: CreateTaskPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    let assignee = match users::get_user(client, table_name, &payload.assigned_to).await? {
        Some(u) => u,
        None => return json_error(StatusCode::BAD_REQUEST, "Assignee does not exist"),
    };
    if actor.user_role == "TeamLeader" && assignee.department != actor.department {
        return json_error(StatusCode::FORBIDDEN, "Assignee is outside your department");
    }

    let task = service::create_task(client, table_name, &actor.user_id, payload).await?;
    tracing::info!("Task {} assigned to {} by {}", task.task_id, task.assigned_to, actor.user_id);
    json_ok(StatusCode::CREATED, &task)
}

/// PATCH /tasks/{id} — the upstream write behind the board's edit callback
pub async fn update_task_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateTaskPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    let existing = match service::get_task(client, table_name, task_id).await? {
        Some(t) => t,
        None => return json_error(StatusCode::NOT_FOUND, "Task not found"),
    };
    if !can_touch(&existing, actor) {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }

    let payload = match normalize_status_progress(payload) {
        Ok(p) => p,
        Err(message) => return json_error(StatusCode::BAD_REQUEST, &message),
    };

    match service::update_task(client, table_name, task_id, payload).await? {
        Some(task) => json_ok(StatusCode::OK, &task),
        None => json_error(StatusCode::NOT_FOUND, "Task not found"),
    }
}

/// DELETE /tasks/{id} — Admin or whoever assigned the task
pub async fn delete_task_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    let existing = match service::get_task(client, table_name, task_id).await? {
        Some(t) => t,
        None => return json_error(StatusCode::NOT_FOUND, "Task not found"),
    };
    if actor.user_role != "Admin" && existing.assigned_by != actor.user_id {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }

    service::delete_task(client, table_name, task_id).await?;
    json_ok(StatusCode::OK, &serde_json::json!({ "message": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(status: Option<&str>, progress: Option<u8>) -> UpdateTaskPayload {
        UpdateTaskPayload {
            title: None,
            description: None,
            documentation: None,
            assigned_to: None,
            status: status.map(|s| s.to_string()),
            progress,
            deadline: None,
        }
    }

    #[test]
    fn explicit_progress_dictates_status() {
        let normalized = normalize_status_progress(payload(Some("Todo"), Some(100))).unwrap();
        assert_eq!(normalized.status.as_deref(), Some("Completed"));
        assert_eq!(normalized.progress, Some(100));

        let normalized = normalize_status_progress(payload(None, Some(30))).unwrap();
        assert_eq!(normalized.status.as_deref(), Some("In Progress"));
    }

    #[test]
    fn bare_status_gets_the_coarse_default() {
        let normalized = normalize_status_progress(payload(Some("In Progress"), None)).unwrap();
        assert_eq!(normalized.progress, Some(50));

        let normalized = normalize_status_progress(payload(Some("Todo"), None)).unwrap();
        assert_eq!(normalized.progress, Some(0));
    }

    #[test]
    fn out_of_range_and_unknown_inputs_are_rejected() {
        assert!(normalize_status_progress(payload(None, Some(101))).is_err());
        assert!(normalize_status_progress(payload(Some("Archived"), None)).is_err());
    }

    #[test]
    fn untouched_fields_pass_through() {
        let normalized = normalize_status_progress(payload(None, None)).unwrap();
        assert!(normalized.status.is_none());
        assert!(normalized.progress.is_none());
    }
}
