use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{Course, CreateCoursePayload, Enrollment};

/// Courses:      PK = "COURSE",       SK = "COURSE#{course_id}"
/// Enrollments:  PK = "USER#{uid}",   SK = "ENROLLMENT#{course_id}"
fn course_from_item(course_id: &str, item: &HashMap<String, AttributeValue>) -> Course {
    Course {
        course_id: course_id.to_string(),
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
        department: item
            .get("department")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        video_url: item
            .get("video_url")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        thumbnail: item
            .get("thumbnail")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        enrolled_count: item
            .get("enrolled_count")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

pub async fn load_courses(client: &DynamoClient, table_name: &str) -> Result<Vec<Course>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("COURSE".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("COURSE#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut courses = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(course_id) = sk.strip_prefix("COURSE#") {
                courses.push(course_from_item(course_id, item));
            }
        }
    }

    Ok(courses)
}

pub async fn get_course(
    client: &DynamoClient,
    table_name: &str,
    course_id: &str,
) -> Result<Option<Course>, String> {
    let sk = format!("COURSE#{}", course_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("COURSE".to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result.item().map(|item| course_from_item(course_id, item)))
}

pub async fn create_course(
    client: &DynamoClient,
    table_name: &str,
    payload: CreateCoursePayload,
) -> Result<Course, String> {
    let course_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("COURSE#{}", course_id);

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("COURSE".to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("title", AttributeValue::S(payload.title.clone()))
        .item("description", AttributeValue::S(payload.description.clone()))
        .item("department", AttributeValue::S(payload.department.clone()))
        .item("video_url", AttributeValue::S(payload.video_url.clone()))
        .item("enrolled_count", AttributeValue::N("0".to_string()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(thumb) = &payload.thumbnail {
        builder = builder.item("thumbnail", AttributeValue::S(thumb.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Course {
        course_id,
        title: payload.title,
        description: payload.description,
        department: payload.department,
        video_url: payload.video_url,
        thumbnail: payload.thumbnail,
        enrolled_count: 0,
        created_at: now,
    })
}

pub async fn load_enrollments(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<Enrollment>, String> {
    let pk = format!("USER#{}", user_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(pk))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("ENROLLMENT#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut enrollments = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(course_id) = sk.strip_prefix("ENROLLMENT#") {
                enrollments.push(Enrollment {
                    course_id: course_id.to_string(),
                    user_id: user_id.to_string(),
                    progress: item
                        .get("progress")
                        .and_then(|v| v.as_n().ok())
                        .and_then(|n| n.parse().ok())
                        .unwrap_or(0),
                    status: item
                        .get("enrollment_status")
                        .and_then(|v| v.as_s().ok())
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Not Started".to_string()),
                    enrolled_at: item
                        .get("enrolled_at")
                        .and_then(|v| v.as_s().ok())
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                });
            }
        }
    }

    Ok(enrollments)
}

pub async fn get_enrollment(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, String> {
    let pk = format!("USER#{}", user_id);
    let sk = format!("ENROLLMENT#{}", course_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result.item().map(|item| Enrollment {
        course_id: course_id.to_string(),
        user_id: user_id.to_string(),
        progress: item
            .get("progress")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
        status: item
            .get("enrollment_status")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Not Started".to_string()),
        enrolled_at: item
            .get("enrolled_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }))
}

/// Enroll a user and bump the course's enrolled counter
pub async fn enroll(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    course_id: &str,
) -> Result<Enrollment, String> {
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("USER#{}", user_id);
    let sk = format!("ENROLLMENT#{}", course_id);

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk))
        .item("SK", AttributeValue::S(sk))
        .item("progress", AttributeValue::N("0".to_string()))
        .item(
            "enrollment_status",
            AttributeValue::S("Not Started".to_string()),
        )
        .item("enrolled_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("COURSE".to_string()))
        .key("SK", AttributeValue::S(format!("COURSE#{}", course_id)))
        .update_expression("ADD enrolled_count :one")
        .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    Ok(Enrollment {
        course_id: course_id.to_string(),
        user_id: user_id.to_string(),
        progress: 0,
        status: "Not Started".to_string(),
        enrolled_at: now,
    })
}

/// Write progress and its derived status in one update
pub async fn set_enrollment_progress(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    course_id: &str,
    progress: u8,
) -> Result<Enrollment, String> {
    let status = match progress {
        0 => "Not Started",
        100 => "Completed",
        _ => "In Progress",
    };
    let pk = format!("USER#{}", user_id);
    let sk = format!("ENROLLMENT#{}", course_id);

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .update_expression("SET progress = :progress, enrollment_status = :status")
        .expression_attribute_values(":progress", AttributeValue::N(progress.to_string()))
        .expression_attribute_values(":status", AttributeValue::S(status.to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    get_enrollment(client, table_name, user_id, course_id)
        .await?
        .ok_or_else(|| format!("Enrollment {}/{} missing after update", user_id, course_id))
}
