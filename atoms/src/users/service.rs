use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateUserPayload, UpdateUserPayload, User};

/// Users live under a collection key:
/// PK = "USER"
/// SK = "USER#{user_id}"
pub fn user_from_item(user_id: &str, item: &HashMap<String, AttributeValue>) -> User {
    User {
        user_id: user_id.to_string(),
        user_name: item
            .get("user_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        user_email: item
            .get("user_email")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        user_role: item
            .get("user_role")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Employee".to_string()),
        department: item
            .get("department")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        phone_number: item
            .get("phone_number")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        profile_image: item
            .get("profile_image")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        skills: item
            .get("skills")
            .and_then(|v| v.as_l().ok())
            .map(|l| {
                l.iter()
                    .filter_map(|v| v.as_s().ok())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default(),
        skill_level: item
            .get("skill_level")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        experience_years: item
            .get("experience_years")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok()),
        description: item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        is_active: item
            .get("is_active")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(true),
        user_created_at: item
            .get("user_created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        user_last_login: item
            .get("user_last_login")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
    }
}

/// Load every user in the directory
pub async fn load_users(client: &DynamoClient, table_name: &str) -> Result<Vec<User>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("USER".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("USER#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut users = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(user_id) = sk.strip_prefix("USER#") {
                users.push(user_from_item(user_id, item));
            }
        }
    }

    Ok(users)
}

/// Create a directory entry for a user (id comes from Cognito at signup,
/// or is minted by the admin create endpoint)
pub async fn create_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: CreateUserPayload,
) -> Result<User, String> {
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("USER#{}", user_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("USER".to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("user_name", AttributeValue::S(payload.user_name.clone()))
        .item("user_email", AttributeValue::S(payload.user_email.clone()))
        .item("user_role", AttributeValue::S(payload.user_role.clone()))
        .item("is_active", AttributeValue::Bool(true))
        .item("user_created_at", AttributeValue::S(now.clone()));

    if let Some(dept) = &payload.department {
        builder = builder.item("department", AttributeValue::S(dept.clone()));
    }
    if let Some(phone) = &payload.phone_number {
        builder = builder.item("phone_number", AttributeValue::S(phone.clone()));
    }
    if let Some(image) = &payload.profile_image {
        builder = builder.item("profile_image", AttributeValue::S(image.clone()));
    }
    if !payload.skills.is_empty() {
        builder = builder.item(
            "skills",
            AttributeValue::L(
                payload
                    .skills
                    .iter()
                    .map(|s| AttributeValue::S(s.clone()))
                    .collect(),
            ),
        );
    }
    if let Some(level) = &payload.skill_level {
        builder = builder.item("skill_level", AttributeValue::S(level.clone()));
    }
    if let Some(years) = payload.experience_years {
        builder = builder.item("experience_years", AttributeValue::N(years.to_string()));
    }
    if let Some(desc) = &payload.description {
        builder = builder.item("description", AttributeValue::S(desc.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(User {
        user_id: user_id.to_string(),
        user_name: payload.user_name,
        user_email: payload.user_email,
        user_role: payload.user_role,
        department: payload.department,
        phone_number: payload.phone_number,
        profile_image: payload.profile_image,
        skills: payload.skills,
        skill_level: payload.skill_level,
        experience_years: payload.experience_years,
        description: payload.description,
        is_active: true,
        user_created_at: now,
        user_last_login: None,
    })
}

pub async fn get_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Option<User>, String> {
    let sk = format!("USER#{}", user_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("USER".to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result.item().map(|item| user_from_item(user_id, item)))
}

pub async fn update_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: UpdateUserPayload,
) -> Result<Option<User>, String> {
    let sk = format!("USER#{}", user_id);

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = payload.user_name {
        update_expr.push("#user_name = :user_name");
        expr_names.insert("#user_name".to_string(), "user_name".to_string());
        expr_values.insert(":user_name".to_string(), AttributeValue::S(name));
    }
    if let Some(role) = payload.user_role {
        update_expr.push("#user_role = :user_role");
        expr_names.insert("#user_role".to_string(), "user_role".to_string());
        expr_values.insert(":user_role".to_string(), AttributeValue::S(role));
    }
    if let Some(dept) = payload.department {
        update_expr.push("department = :department");
        expr_values.insert(":department".to_string(), AttributeValue::S(dept));
    }
    if let Some(phone) = payload.phone_number {
        update_expr.push("phone_number = :phone_number");
        expr_values.insert(":phone_number".to_string(), AttributeValue::S(phone));
    }
    if let Some(image) = payload.profile_image {
        update_expr.push("profile_image = :profile_image");
        expr_values.insert(":profile_image".to_string(), AttributeValue::S(image));
    }
    if let Some(skills) = payload.skills {
        update_expr.push("skills = :skills");
        expr_values.insert(
            ":skills".to_string(),
            AttributeValue::L(skills.into_iter().map(AttributeValue::S).collect()),
        );
    }
    if let Some(level) = payload.skill_level {
        update_expr.push("skill_level = :skill_level");
        expr_values.insert(":skill_level".to_string(), AttributeValue::S(level));
    }
    if let Some(years) = payload.experience_years {
        update_expr.push("experience_years = :experience_years");
        expr_values.insert(
            ":experience_years".to_string(),
            AttributeValue::N(years.to_string()),
        );
    }
    if let Some(desc) = payload.description {
        update_expr.push("description = :description");
        expr_values.insert(":description".to_string(), AttributeValue::S(desc));
    }
    if let Some(active) = payload.is_active {
        update_expr.push("is_active = :is_active");
        expr_values.insert(":is_active".to_string(), AttributeValue::Bool(active));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("USER".to_string()))
            .key("SK", AttributeValue::S(sk))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_user(client, table_name, user_id).await
}

pub async fn delete_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<(), String> {
    let sk = format!("USER#{}", user_id);

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("USER".to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// Stamp user_last_login; failures are logged, never surfaced to the caller
pub async fn touch_last_login(client: &DynamoClient, table_name: &str, user_id: &str) {
    let sk = format!("USER#{}", user_id);
    let now = chrono::Utc::now().to_rfc3339();

    if let Err(e) = client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("USER".to_string()))
        .key("SK", AttributeValue::S(sk))
        .update_expression("SET user_last_login = :login")
        .expression_attribute_values(":login", AttributeValue::S(now))
        .send()
        .await
    {
        tracing::warn!("Failed to stamp last login for {}: {}", user_id, e);
    }
}
