use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateNotificationPayload, Notification};

/// PK = "NOTIFICATION"
/// SK = "NOTIFICATION#{notification_id}"
fn notification_from_item(
    notification_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> Notification {
    Notification {
        notification_id: notification_id.to_string(),
        kind: item
            .get("kind")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "System".to_string()),
        title: item
            .get("title")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        message: item
            .get("message")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        sender_id: item
            .get("sender_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        recipient_id: item
            .get("recipient_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        department: item
            .get("department")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        read: item
            .get("read")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Load the whole feed, newest first; callers apply role scoping
pub async fn load_notifications(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Vec<Notification>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("NOTIFICATION".to_string()))
        .expression_attribute_values(
            ":sk_prefix",
            AttributeValue::S("NOTIFICATION#".to_string()),
        )
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut notifications = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(id) = sk.strip_prefix("NOTIFICATION#") {
                notifications.push(notification_from_item(id, item));
            }
        }
    }

    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(notifications)
}

pub async fn create_notification(
    client: &DynamoClient,
    table_name: &str,
    sender_id: &str,
    payload: CreateNotificationPayload,
) -> Result<Notification, String> {
    let notification_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("NOTIFICATION#{}", notification_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("NOTIFICATION".to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("kind", AttributeValue::S(payload.kind.clone()))
        .item("title", AttributeValue::S(payload.title.clone()))
        .item("message", AttributeValue::S(payload.message.clone()))
        .item("sender_id", AttributeValue::S(sender_id.to_string()))
        .item("read", AttributeValue::Bool(false))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(recipient) = &payload.recipient_id {
        builder = builder.item("recipient_id", AttributeValue::S(recipient.clone()));
    }
    if let Some(dept) = &payload.department {
        builder = builder.item("department", AttributeValue::S(dept.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Notification {
        notification_id,
        kind: payload.kind,
        title: payload.title,
        message: payload.message,
        sender_id: sender_id.to_string(),
        recipient_id: payload.recipient_id,
        department: payload.department,
        read: false,
        created_at: now,
    })
}

pub async fn mark_read(
    client: &DynamoClient,
    table_name: &str,
    notification_id: &str,
) -> Result<(), String> {
    let sk = format!("NOTIFICATION#{}", notification_id);

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("NOTIFICATION".to_string()))
        .key("SK", AttributeValue::S(sk))
        .update_expression("SET #read = :read")
        .expression_attribute_names("#read", "read")
        .expression_attribute_values(":read", AttributeValue::Bool(true))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    Ok(())
}

pub async fn delete_notification(
    client: &DynamoClient,
    table_name: &str,
    notification_id: &str,
) -> Result<(), String> {
    let sk = format!("NOTIFICATION#{}", notification_id);

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("NOTIFICATION".to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}
