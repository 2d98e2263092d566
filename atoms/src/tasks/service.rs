use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{CreateTaskPayload, Task, UpdateTaskPayload};

/// Tasks live under a collection key:
/// PK = "TASK"
/// SK = "TASK#{task_id}"
fn task_from_item(task_id: &str, item: &HashMap<String, AttributeValue>) -> Task {
    Task {
        task_id: task_id.to_string(),
        title: item
            .get("title")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        description: item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        documentation: item
            .get("documentation")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        assigned_to: item
            .get("assigned_to")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        assigned_by: item
            .get("assigned_by")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        status: item
            .get("task_status")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        progress: item
            .get("progress")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
        deadline: item
            .get("deadline")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// Load every task (pure persistence, no role scoping - callers filter)
pub async fn load_tasks(client: &DynamoClient, table_name: &str) -> Result<Vec<Task>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("TASK".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("TASK#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut tasks = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(task_id) = sk.strip_prefix("TASK#") {
                tasks.push(task_from_item(task_id, item));
            }
        }
    }

    Ok(tasks)
}

pub async fn get_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<Option<Task>, String> {
    let sk = format!("TASK#{}", task_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("TASK".to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result.item().map(|item| task_from_item(task_id, item)))
}

/// New assignments always start at the left edge of the board
pub async fn create_task(
    client: &DynamoClient,
    table_name: &str,
    assigned_by: &str,
    payload: CreateTaskPayload,
) -> Result<Task, String> {
    let task_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("TASK#{}", task_id);

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("TASK".to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("title", AttributeValue::S(payload.title.clone()))
        .item("description", AttributeValue::S(payload.description.clone()))
        .item("assigned_to", AttributeValue::S(payload.assigned_to.clone()))
        .item("assigned_by", AttributeValue::S(assigned_by.to_string()))
        .item("task_status", AttributeValue::S("Todo".to_string()))
        .item("progress", AttributeValue::N("0".to_string()))
        .item("deadline", AttributeValue::S(payload.deadline.clone()))
        .item("created_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Task {
        task_id,
        title: payload.title,
        description: payload.description,
        documentation: None,
        assigned_to: payload.assigned_to,
        assigned_by: assigned_by.to_string(),
        status: "Todo".to_string(),
        progress: 0,
        deadline: payload.deadline,
        created_at: now,
    })
}

pub async fn update_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
    payload: UpdateTaskPayload,
) -> Result<Option<Task>, String> {
    let sk = format!("TASK#{}", task_id);

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(title) = payload.title {
        update_expr.push("title = :title");
        expr_values.insert(":title".to_string(), AttributeValue::S(title));
    }
    if let Some(desc) = payload.description {
        update_expr.push("description = :description");
        expr_values.insert(":description".to_string(), AttributeValue::S(desc));
    }
    if let Some(doc) = payload.documentation {
        update_expr.push("documentation = :documentation");
        expr_values.insert(":documentation".to_string(), AttributeValue::S(doc));
    }
    if let Some(assignee) = payload.assigned_to {
        update_expr.push("assigned_to = :assigned_to");
        expr_values.insert(":assigned_to".to_string(), AttributeValue::S(assignee));
    }
    if let Some(status) = payload.status {
        update_expr.push("#task_status = :task_status");
        expr_names.insert("#task_status".to_string(), "task_status".to_string());
        expr_values.insert(":task_status".to_string(), AttributeValue::S(status));
    }
    if let Some(progress) = payload.progress {
        update_expr.push("progress = :progress");
        expr_values.insert(
            ":progress".to_string(),
            AttributeValue::N(progress.to_string()),
        );
    }
    if let Some(deadline) = payload.deadline {
        update_expr.push("deadline = :deadline");
        expr_values.insert(":deadline".to_string(), AttributeValue::S(deadline));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S("TASK".to_string()))
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

    get_task(client, table_name, task_id).await
}

pub async fn delete_task(
    client: &DynamoClient,
    table_name: &str,
    task_id: &str,
) -> Result<(), String> {
    let sk = format!("TASK#{}", task_id);

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("TASK".to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}
