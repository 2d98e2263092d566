use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::LoginSession;
use super::service;
use crate::users::model::User;

/// GET /sessions — Admin gets the recent 50 across all users, anyone else
/// their own recent 10
pub async fn list_sessions(
    client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    let visible: Vec<LoginSession> = if actor.user_role == "Admin" {
        service::load_recent(client, table_name, 50).await?
    } else {
        service::load_recent(client, table_name, 200)
            .await?
            .into_iter()
            .filter(|s| s.user_id == actor.user_id)
            .take(10)
            .collect()
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&visible)?.into())
        .map_err(Box::new)?)
}
