use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::LoginSession;

/// PK = "SESSION"
/// SK = "SESSION#{login_time}#{session_id}"
/// The rfc3339 timestamp in the sort key keeps the query time-ordered.
fn session_from_item(item: &HashMap<String, AttributeValue>) -> Option<LoginSession> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let rest = sk.strip_prefix("SESSION#")?;
    let (login_time, session_id) = rest.rsplit_once('#')?;

    Some(LoginSession {
        session_id: session_id.to_string(),
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        user_name: item
            .get("user_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        user_agent: item
            .get("user_agent")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        ip_address: item
            .get("ip_address")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        login_time: login_time.to_string(),
        logout_time: item
            .get("logout_time")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        active: item
            .get("active")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
    })
}

pub async fn record_login(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    user_name: &str,
    user_agent: Option<&str>,
    ip_address: Option<&str>,
) -> Result<LoginSession, String> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("SESSION#{}#{}", now, session_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("SESSION".to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("user_id", AttributeValue::S(user_id.to_string()))
        .item("user_name", AttributeValue::S(user_name.to_string()))
        .item("active", AttributeValue::Bool(true));

    if let Some(agent) = user_agent {
        builder = builder.item("user_agent", AttributeValue::S(agent.to_string()));
    }
    if let Some(ip) = ip_address {
        builder = builder.item("ip_address", AttributeValue::S(ip.to_string()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(LoginSession {
        session_id,
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        user_agent: user_agent.map(|s| s.to_string()),
        ip_address: ip_address.map(|s| s.to_string()),
        login_time: now,
        logout_time: None,
        active: true,
    })
}

/// Newest first
pub async fn load_recent(
    client: &DynamoClient,
    table_name: &str,
    limit: i32,
) -> Result<Vec<LoginSession>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("SESSION".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("SESSION#".to_string()))
        .scan_index_forward(false)
        .limit(limit)
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    Ok(result
        .items()
        .iter()
        .filter_map(session_from_item)
        .collect())
}

/// Close every active session for a user (logout). Filters server-side on
/// the owner and the active flag so a long-lived session is still found no
/// matter how many logins other users have stacked on top of it.
pub async fn close_sessions(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<(), String> {
    let now = chrono::Utc::now().to_rfc3339();

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .filter_expression("user_id = :uid AND active = :active")
        .expression_attribute_values(":pk", AttributeValue::S("SESSION".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("SESSION#".to_string()))
        .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
        .expression_attribute_values(":active", AttributeValue::Bool(true))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let sessions: Vec<_> = result.items().iter().filter_map(session_from_item).collect();

    for session in &sessions {
        let sk = format!("SESSION#{}#{}", session.login_time, session.session_id);
        client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("SESSION".to_string()))
            .key("SK", AttributeValue::S(sk))
            .update_expression("SET active = :active, logout_time = :logout")
            .expression_attribute_values(":active", AttributeValue::Bool(false))
            .expression_attribute_values(":logout", AttributeValue::S(now.clone()))
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    Ok(())
}
