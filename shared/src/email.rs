use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_sesv2::types::{Body as MessageBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::{Deserialize, Serialize};

use hrhub_atoms::users;
use hrhub_atoms::users::model::User;

#[derive(Deserialize)]
pub struct ComposeRequest {
    pub recipient_ids: Vec<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Serialize)]
struct ComposeResponse {
    message: String,
    sent: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

fn error_response(
    status: StatusCode,
    error: &str,
    message: &str,
) -> Result<Response<Body>, Error> {
    let body = ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
    };
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&body)?.into())
        .map_err(Box::new)?)
}

async fn send_message(
    ses_client: &SesClient,
    sender_address: &str,
    recipient: &str,
    subject: &str,
    body_text: &str,
) -> Result<(), String> {
    let subject_content = Content::builder()
        .data(subject)
        .build()
        .map_err(|e| format!("SES content error: {}", e))?;
    let body_content = Content::builder()
        .data(body_text)
        .build()
        .map_err(|e| format!("SES content error: {}", e))?;
    let message = Message::builder()
        .subject(subject_content)
        .body(MessageBody::builder().text(body_content).build())
        .build();

    ses_client
        .send_email()
        .from_email_address(sender_address)
        .destination(Destination::builder().to_addresses(recipient).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await
        .map_err(|e| format!("SES send_email error: {}", e))?;

    Ok(())
}

/// Handle POST /email: an Admin or TeamLeader writes to a set of directory
/// users. One email per recipient so addresses are never cross-exposed.
pub async fn handle_compose(
    ses_client: &SesClient,
    dynamo_client: &DynamoClient,
    table_name: &str,
    sender_address: &str,
    actor: &User,
    body: &Body,
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" && actor.user_role != "TeamLeader" {
        return error_response(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "Only admins and team leaders can send emails",
        );
    }

    let body_str = match body {
        Body::Text(text) => text,
        Body::Binary(bytes) => std::str::from_utf8(bytes).unwrap_or(""),
        Body::Empty => "",
    };

    let compose_request: ComposeRequest = match serde_json::from_str(body_str) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Failed to parse compose request: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                &format!("Invalid request body: {}", e),
            );
        }
    };

    if compose_request.recipient_ids.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "InvalidRecipients",
            "Please select at least one recipient",
        );
    }
    if compose_request.subject.is_empty() || compose_request.message.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "InvalidMessage",
            "Please provide a subject and a message",
        );
    }

    // Resolve recipient ids against the directory in one query
    let directory = users::load_users(dynamo_client, table_name).await?;
    let mut recipients = Vec::new();
    for id in &compose_request.recipient_ids {
        match directory.iter().find(|u| &u.user_id == id) {
            Some(user) if user.is_active => recipients.push(user.user_email.clone()),
            Some(_) => {
                tracing::warn!("Skipping deactivated email recipient {}", id);
            }
            None => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    "UnknownRecipient",
                    &format!("No user with id {}", id),
                );
            }
        }
    }

    let mut sent = 0;
    for email in &recipients {
        match send_message(
            ses_client,
            sender_address,
            email,
            &compose_request.subject,
            &compose_request.message,
        )
        .await
        {
            Ok(_) => sent += 1,
            Err(e) => {
                tracing::error!("Failed to send email to {}: {}", email, e);
            }
        }
    }

    if sent == 0 {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "EmailFailed",
            "Failed to send message. Please try again later.",
        );
    }

    tracing::info!("User {} sent email to {} recipients", actor.user_id, sent);

    let response = ComposeResponse {
        message: "Message sent successfully".to_string(),
        sent,
    };
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&response)?.into())
        .map_err(Box::new)?)
}
