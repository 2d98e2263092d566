use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateNotificationPayload, Notification};
use super::service;
use crate::users::model::User;

const ADMIN_FEED_LIMIT: usize = 10;
const USER_FEED_LIMIT: usize = 10;

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

fn visible_to(notification: &Notification, actor: &User) -> bool {
    match (&notification.recipient_id, &notification.department) {
        (Some(recipient), _) => recipient == &actor.user_id,
        (None, Some(dept)) => Some(dept) == actor.department.as_ref(),
        (None, None) => true, // broadcast
    }
}

/// `read` is one shared attribute on the item, so flipping it affects every
/// recipient; only someone the notification reaches (or its sender, or an
/// Admin) may do that.
fn can_mark_read(notification: &Notification, actor: &User) -> bool {
    actor.user_role == "Admin"
        || notification.sender_id == actor.user_id
        || visible_to(notification, actor)
}

/// GET /notifications — Admin reads the raw feed, others what is addressed
/// to them or their department
pub async fn list_notifications(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    let notifications = service::load_notifications(client, table_name).await?;

    let visible: Vec<Notification> = if actor.user_role == "Admin" {
        notifications.into_iter().take(ADMIN_FEED_LIMIT).collect()
    } else {
        notifications
            .into_iter()
            .filter(|n| visible_to(n, actor))
            .take(USER_FEED_LIMIT)
            .collect()
    };

    json_ok(StatusCode::OK, &visible)
}

/// POST /notifications — Admin or TeamLeader
pub async fn create_notification_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" && actor.user_role != "TeamLeader" {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }

    let payload: CreateNotificationPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    if payload.title.is_empty() || payload.message.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Missing required fields");
    }

    let notification =
        service::create_notification(client, table_name, &actor.user_id, payload).await?;
    json_ok(StatusCode::CREATED, &notification)
}

/// PATCH /notifications/{id}/read — gated on reachability, see `can_mark_read`
pub async fn mark_read_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    notification_id: &str,
) -> Result<Response<Body>, Error> {
    let notifications = service::load_notifications(client, table_name).await?;
    let notification = match notifications
        .iter()
        .find(|n| n.notification_id == notification_id)
    {
        Some(n) => n,
        None => return json_error(StatusCode::NOT_FOUND, "Notification not found"),
    };
    if !can_mark_read(notification, actor) {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }

    service::mark_read(client, table_name, notification_id).await?;
    json_ok(StatusCode::OK, &serde_json::json!({ "message": "ok" }))
}

/// DELETE /notifications/{id} — Admin, or the user who sent it
pub async fn delete_notification_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    notification_id: &str,
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" {
        let notifications = service::load_notifications(client, table_name).await?;
        let owned = notifications
            .iter()
            .any(|n| n.notification_id == notification_id && n.sender_id == actor.user_id);
        if !owned {
            return json_error(StatusCode::FORBIDDEN, "Forbidden");
        }
    }

    service::delete_notification(client, table_name, notification_id).await?;
    json_ok(StatusCode::OK, &serde_json::json!({ "message": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: &str, dept: Option<&str>) -> User {
        User {
            user_id: id.to_string(),
            user_name: format!("User {}", id),
            user_email: format!("{}@example.com", id),
            user_role: role.to_string(),
            department: dept.map(|d| d.to_string()),
            phone_number: None,
            profile_image: None,
            skills: vec![],
            skill_level: None,
            experience_years: None,
            description: None,
            is_active: true,
            user_created_at: "2026-01-01T00:00:00Z".to_string(),
            user_last_login: None,
        }
    }

    fn notification(recipient: Option<&str>, dept: Option<&str>) -> Notification {
        Notification {
            notification_id: "n1".to_string(),
            kind: "Message".to_string(),
            title: "title".to_string(),
            message: "message".to_string(),
            sender_id: "lead-1".to_string(),
            recipient_id: recipient.map(|r| r.to_string()),
            department: dept.map(|d| d.to_string()),
            read: false,
            created_at: "2026-02-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn directed_notification_is_visible_only_to_its_recipient() {
        let n = notification(Some("emp-1"), None);
        assert!(visible_to(&n, &user("emp-1", "Employee", Some("IT"))));
        assert!(!visible_to(&n, &user("emp-2", "Employee", Some("IT"))));
    }

    #[test]
    fn department_notification_is_scoped_to_that_department() {
        let n = notification(None, Some("Finance"));
        assert!(visible_to(&n, &user("emp-1", "Employee", Some("Finance"))));
        assert!(!visible_to(&n, &user("emp-2", "Employee", Some("IT"))));
        assert!(!visible_to(&n, &user("emp-3", "Employee", None)));
    }

    #[test]
    fn broadcast_reaches_everyone() {
        let n = notification(None, None);
        assert!(visible_to(&n, &user("emp-1", "Employee", None)));
        assert!(visible_to(&n, &user("admin-1", "Admin", None)));
    }

    #[test]
    fn mark_read_is_denied_outside_the_notification_reach() {
        // directed at emp-1; an unrelated employee cannot flip the shared flag
        let directed = notification(Some("emp-1"), None);
        assert!(!can_mark_read(&directed, &user("emp-2", "Employee", Some("IT"))));

        // nor can a department outsider mark a department notice
        let dept = notification(None, Some("Finance"));
        assert!(!can_mark_read(&dept, &user("emp-2", "Employee", Some("IT"))));
    }

    #[test]
    fn recipient_sender_and_admin_may_mark_read() {
        let directed = notification(Some("emp-1"), None);
        assert!(can_mark_read(&directed, &user("emp-1", "Employee", Some("IT"))));
        assert!(can_mark_read(&directed, &user("lead-1", "TeamLeader", Some("IT"))));
        assert!(can_mark_read(&directed, &user("admin-1", "Admin", None)));
    }
}
