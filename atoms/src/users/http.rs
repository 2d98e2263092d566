use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateUserPayload, UpdateUserPayload, User};
use super::service;

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

/// GET /users — Admin sees the whole directory, a TeamLeader their own
/// department, an Employee nothing
pub async fn list_users(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    let users = service::load_users(client, table_name).await?;

    let visible: Vec<User> = match actor.user_role.as_str() {
        "Admin" => users,
        "TeamLeader" => users
            .into_iter()
            .filter(|u| u.department == actor.department)
            .collect(),
        _ => return json_error(StatusCode::FORBIDDEN, "Forbidden"),
    };

    json_ok(StatusCode::OK, &visible)
}

/// GET /users/me
pub async fn get_me(actor: &User) -> Result<Response<Body>, Error> {
    json_ok(StatusCode::OK, actor)
}

/// POST /users — Admin only
pub async fn create_user_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }

    let payload: CreateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    let user_id = uuid::Uuid::new_v4().to_string();
    let user = service::create_user(client, table_name, &user_id, payload).await?;

    tracing::info!("User {} created by {}", user.user_id, actor.user_id);
    json_ok(StatusCode::CREATED, &user)
}

/// PATCH /users/{id} — Admin edits anyone; everyone else may edit their own
/// profile fields but not role or active flag
pub async fn update_user_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let mut payload: UpdateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    if actor.user_role != "Admin" {
        if actor.user_id != user_id {
            return json_error(StatusCode::FORBIDDEN, "Forbidden");
        }
        payload.user_role = None;
        payload.is_active = None;
    }

    match service::update_user(client, table_name, user_id, payload).await? {
        Some(user) => json_ok(StatusCode::OK, &user),
        None => json_error(StatusCode::NOT_FOUND, "User not found"),
    }
}

/// DELETE /users/{id} — Admin only; deactivates before removing the item so
/// any cached session sees is_active = false
pub async fn delete_user_handler(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" {
        return json_error(StatusCode::FORBIDDEN, "Forbidden");
    }
    if actor.user_id == user_id {
        return json_error(StatusCode::BAD_REQUEST, "Cannot delete your own account");
    }

    let deactivate = UpdateUserPayload {
        user_name: None,
        user_role: None,
        department: None,
        phone_number: None,
        profile_image: None,
        skills: None,
        skill_level: None,
        experience_years: None,
        description: None,
        is_active: Some(false),
    };
    service::update_user(client, table_name, user_id, deactivate).await?;
    service::delete_user(client, table_name, user_id).await?;

    tracing::info!("User {} deleted by {}", user_id, actor.user_id);
    json_ok(StatusCode::OK, &serde_json::json!({ "message": "ok" }))
}
