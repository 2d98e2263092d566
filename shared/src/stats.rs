use std::collections::{BTreeMap, HashMap, HashSet};

use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

use hrhub_atoms::courses;
use hrhub_atoms::courses::model::Course;
use hrhub_atoms::sessions;
use hrhub_atoms::sessions::LoginSession;
use hrhub_atoms::tasks;
use hrhub_atoms::tasks::model::Task;
use hrhub_atoms::users;
use hrhub_atoms::users::model::User;

const RECENT_SESSION_COUNT: usize = 5;

/// One slice of a chart: a label and a count
#[derive(Debug, Serialize, PartialEq)]
pub struct StatSlice {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
    pub id: String,
    pub user_name: String,
    pub login_time: String,
    pub is_active: bool,
}

/// Aggregate figures for the admin dashboard. Field names are the wire
/// contract the dashboard charts bind to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u32,
    pub active_users: u32,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub total_courses: u32,
    pub active_sessions: u32,
    pub department_stats: Vec<StatSlice>,
    pub task_stats: Vec<StatSlice>,
    pub role_stats: Vec<StatSlice>,
    pub recent_sessions: Vec<RecentSession>,
}

fn count_where<T>(items: &[T], pred: impl Fn(&T) -> bool) -> u32 {
    items.iter().filter(|i| pred(i)).count() as u32
}

fn department_slices(all_users: &[User]) -> Vec<StatSlice> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for user in all_users {
        if let Some(dept) = &user.department {
            *counts.entry(dept.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(name, value)| StatSlice {
            name: name.to_string(),
            value,
        })
        .collect()
}

fn task_slices(all_tasks: &[Task]) -> Vec<StatSlice> {
    [("Completed", "Completed"), ("In Progress", "In Progress"), ("Todo", "Todo")]
        .iter()
        .map(|(label, status)| StatSlice {
            name: label.to_string(),
            value: count_where(all_tasks, |t| t.status == *status),
        })
        .collect()
}

fn role_slices(all_users: &[User]) -> Vec<StatSlice> {
    [("Admins", "Admin"), ("Team Leaders", "TeamLeader"), ("Employees", "Employee")]
        .iter()
        .map(|(label, role)| StatSlice {
            name: label.to_string(),
            value: count_where(all_users, |u| u.user_role == *role),
        })
        .collect()
}

fn build_stats(
    all_users: &[User],
    all_tasks: &[Task],
    course_count: u32,
    recent: &[LoginSession],
) -> DashboardStats {
    DashboardStats {
        total_users: all_users.len() as u32,
        active_users: count_where(all_users, |u| u.is_active),
        total_tasks: all_tasks.len() as u32,
        completed_tasks: count_where(all_tasks, |t| t.status == "Completed"),
        total_courses: course_count,
        active_sessions: count_where(recent, |s| s.active),
        department_stats: department_slices(all_users),
        task_stats: task_slices(all_tasks),
        role_stats: role_slices(all_users),
        recent_sessions: recent
            .iter()
            .take(RECENT_SESSION_COUNT)
            .map(|s| RecentSession {
                id: s.session_id.clone(),
                user_name: s.user_name.clone(),
                login_time: s.login_time.clone(),
                is_active: s.active,
            })
            .collect(),
    }
}

/// Handle GET /dashboard/stats (admins only)
pub async fn handle_dashboard_stats(
    dynamo_client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    if actor.user_role != "Admin" {
        return Ok(Response::builder()
            .status(StatusCode::FORBIDDEN)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({ "error": "Only admins can view dashboard stats" })
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    let (users_result, tasks_result, courses_result, sessions_result) = tokio::join!(
        users::load_users(dynamo_client, table_name),
        tasks::load_tasks(dynamo_client, table_name),
        courses::load_courses(dynamo_client, table_name),
        sessions::load_recent(dynamo_client, table_name, 200),
    );

    let all_users = users_result?;
    let all_tasks = tasks_result?;
    let all_courses = courses_result?;
    let recent = sessions_result?;

    let stats = build_stats(&all_users, &all_tasks, all_courses.len() as u32, &recent);

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&stats)?.into())
        .map_err(Box::new)?)
}

/// Department-scoped view for team leaders. Same wire discipline as
/// `DashboardStats`: camelCase field names are the contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDashboard {
    pub department: String,
    pub team_members: TeamMembers,
    pub tasks: TeamTasks,
    pub courses: TeamCourses,
    pub performance: TeamPerformance,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembers {
    pub total: u32,
    pub list: Vec<User>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTasks {
    pub total: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub todo: u32,
    pub list: Vec<Task>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamCourses {
    pub total: u32,
    pub list: Vec<Course>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPerformance {
    pub metrics: Vec<MemberPerformance>,
    pub best_performer: Option<MemberPerformance>,
    pub worst_performer: Option<MemberPerformance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPerformance {
    pub id: String,
    pub name: String,
    pub email: String,
    pub task_stats: MemberTaskStats,
    pub course_stats: MemberCourseStats,
    pub overall_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTaskStats {
    pub completed: u32,
    pub total: u32,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCourseStats {
    pub enrolled: u32,
    pub total: u32,
    pub enrollment_rate: f64,
}

fn round_rate(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_rate(part as f64 / whole as f64 * 100.0)
}

/// `enrolled_by_member` counts each member's enrollments in this
/// department's courses only; cross-department enrollments don't score.
fn build_team_dashboard(
    department: &str,
    all_users: &[User],
    all_tasks: &[Task],
    all_courses: &[Course],
    enrolled_by_member: &HashMap<String, u32>,
) -> TeamDashboard {
    let team_members: Vec<User> = all_users
        .iter()
        .filter(|u| u.user_role == "Employee" && u.department.as_deref() == Some(department))
        .cloned()
        .collect();

    // Tasks join through the assignee's department, whatever their role
    let dept_user_ids: HashSet<&str> = all_users
        .iter()
        .filter(|u| u.department.as_deref() == Some(department))
        .map(|u| u.user_id.as_str())
        .collect();
    let dept_tasks: Vec<Task> = all_tasks
        .iter()
        .filter(|t| dept_user_ids.contains(t.assigned_to.as_str()))
        .cloned()
        .collect();

    let dept_courses: Vec<Course> = all_courses
        .iter()
        .filter(|c| c.department == department)
        .cloned()
        .collect();
    let course_total = dept_courses.len() as u32;

    let mut metrics: Vec<MemberPerformance> = team_members
        .iter()
        .map(|member| {
            let member_tasks: Vec<&Task> =
                dept_tasks.iter().filter(|t| t.assigned_to == member.user_id).collect();
            let tasks_total = member_tasks.len() as u32;
            let tasks_completed =
                member_tasks.iter().filter(|t| t.status == "Completed").count() as u32;
            let completion_rate = percentage(tasks_completed, tasks_total);

            let enrolled = enrolled_by_member.get(&member.user_id).copied().unwrap_or(0);
            let enrollment_rate = percentage(enrolled, course_total);

            MemberPerformance {
                id: member.user_id.clone(),
                name: member.user_name.clone(),
                email: member.user_email.clone(),
                task_stats: MemberTaskStats {
                    completed: tasks_completed,
                    total: tasks_total,
                    completion_rate,
                },
                course_stats: MemberCourseStats {
                    enrolled,
                    total: course_total,
                    enrollment_rate,
                },
                overall_rating: round_rate((completion_rate + enrollment_rate) / 2.0),
            }
        })
        .collect();
    metrics.sort_by(|a, b| {
        b.overall_rating
            .partial_cmp(&a.overall_rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    TeamDashboard {
        department: department.to_string(),
        team_members: TeamMembers { total: team_members.len() as u32, list: team_members },
        tasks: TeamTasks {
            total: dept_tasks.len() as u32,
            completed: count_where(&dept_tasks, |t| t.status == "Completed"),
            in_progress: count_where(&dept_tasks, |t| t.status == "In Progress"),
            todo: count_where(&dept_tasks, |t| t.status == "Todo"),
            list: dept_tasks,
        },
        courses: TeamCourses { total: course_total, list: dept_courses },
        performance: TeamPerformance {
            best_performer: metrics.first().cloned(),
            worst_performer: metrics.last().cloned(),
            metrics,
        },
    }
}

/// Handle GET /dashboard/team (team leaders only)
pub async fn handle_team_dashboard(
    dynamo_client: &DynamoClient,
    table_name: &str,
    actor: &User,
) -> Result<Response<Body>, Error> {
    if actor.user_role != "TeamLeader" {
        return Ok(Response::builder()
            .status(StatusCode::FORBIDDEN)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({ "error": "Only team leaders can view the team dashboard" })
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }
    let department = match actor.department.as_deref() {
        Some(d) => d,
        None => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({ "error": "Team leader has no department assigned" })
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
    };

    let (users_result, tasks_result, courses_result) = tokio::join!(
        users::load_users(dynamo_client, table_name),
        tasks::load_tasks(dynamo_client, table_name),
        courses::load_courses(dynamo_client, table_name),
    );

    let all_users = users_result?;
    let all_tasks = tasks_result?;
    let all_courses = courses_result?;

    let dept_course_ids: HashSet<&str> = all_courses
        .iter()
        .filter(|c| c.department == department)
        .map(|c| c.course_id.as_str())
        .collect();

    let mut enrolled_by_member: HashMap<String, u32> = HashMap::new();
    for member in all_users
        .iter()
        .filter(|u| u.user_role == "Employee" && u.department.as_deref() == Some(department))
    {
        let enrollments =
            courses::load_enrollments(dynamo_client, table_name, &member.user_id).await?;
        let enrolled = enrollments
            .iter()
            .filter(|e| dept_course_ids.contains(e.course_id.as_str()))
            .count() as u32;
        enrolled_by_member.insert(member.user_id.clone(), enrolled);
    }

    let dashboard =
        build_team_dashboard(department, &all_users, &all_tasks, &all_courses, &enrolled_by_member);

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&dashboard)?.into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: &str, dept: Option<&str>, active: bool) -> User {
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
            is_active: active,
            user_created_at: "2026-01-01T00:00:00Z".to_string(),
            user_last_login: None,
        }
    }

    fn task(id: &str, status: &str) -> Task {
        Task {
            task_id: id.to_string(),
            title: format!("Task {}", id),
            description: String::new(),
            documentation: None,
            assigned_to: "u1".to_string(),
            assigned_by: "u2".to_string(),
            status: status.to_string(),
            progress: 0,
            deadline: "2026-12-31".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn session(id: &str, active: bool) -> LoginSession {
        LoginSession {
            session_id: id.to_string(),
            user_id: "u1".to_string(),
            user_name: "User u1".to_string(),
            user_agent: None,
            ip_address: None,
            login_time: format!("2026-02-0{}T09:00:00Z", id),
            logout_time: None,
            active,
        }
    }

    #[test]
    fn counts_cover_users_tasks_and_sessions() {
        let all_users = vec![
            user("a", "Admin", Some("IT"), true),
            user("b", "TeamLeader", Some("IT"), true),
            user("c", "Employee", Some("Sales"), false),
        ];
        let all_tasks = vec![task("1", "Todo"), task("2", "Completed"), task("3", "Completed")];
        let recent = vec![session("1", true), session("2", false)];

        let stats = build_stats(&all_users, &all_tasks, 4, &recent);

        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.total_courses, 4);
        assert_eq!(stats.active_sessions, 1);
        assert_eq!(stats.recent_sessions.len(), 2);
        assert_eq!(stats.recent_sessions[0].user_name, "User u1");
    }

    #[test]
    fn department_slices_skip_users_without_a_department() {
        let all_users = vec![
            user("a", "Admin", None, true),
            user("b", "Employee", Some("Finance"), true),
            user("c", "Employee", Some("Finance"), true),
            user("d", "Employee", Some("IT"), true),
        ];
        let slices = department_slices(&all_users);
        assert_eq!(
            slices,
            vec![
                StatSlice { name: "Finance".to_string(), value: 2 },
                StatSlice { name: "IT".to_string(), value: 1 },
            ]
        );
    }

    #[test]
    fn task_and_role_slices_keep_chart_order() {
        let all_tasks = vec![task("1", "In Progress"), task("2", "Todo"), task("3", "Todo")];
        let slices = task_slices(&all_tasks);
        assert_eq!(slices[0].name, "Completed");
        assert_eq!(slices[0].value, 0);
        assert_eq!(slices[1].name, "In Progress");
        assert_eq!(slices[1].value, 1);
        assert_eq!(slices[2].name, "Todo");
        assert_eq!(slices[2].value, 2);

        let all_users = vec![user("a", "Admin", None, true), user("b", "Employee", None, true)];
        let roles = role_slices(&all_users);
        assert_eq!(roles[0], StatSlice { name: "Admins".to_string(), value: 1 });
        assert_eq!(roles[2], StatSlice { name: "Employees".to_string(), value: 1 });
    }

    #[test]
    fn recent_sessions_are_capped() {
        let recent: Vec<LoginSession> =
            (1..=8).map(|i| session(&i.to_string(), true)).collect();
        let stats = build_stats(&[], &[], 0, &recent);
        assert_eq!(stats.recent_sessions.len(), RECENT_SESSION_COUNT);
    }

    fn task_for(id: &str, assignee: &str, status: &str) -> Task {
        let mut t = task(id, status);
        t.assigned_to = assignee.to_string();
        t
    }

    fn course(id: &str, dept: &str) -> Course {
        Course {
            course_id: id.to_string(),
            title: format!("Course {}", id),
            description: String::new(),
            department: dept.to_string(),
            video_url: "https://example.com/video".to_string(),
            thumbnail: None,
            enrolled_count: 0,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn team_dashboard_is_scoped_to_the_leaders_department() {
        let all_users = vec![
            user("lead", "TeamLeader", Some("IT"), true),
            user("e1", "Employee", Some("IT"), true),
            user("e2", "Employee", Some("IT"), true),
            user("f1", "Employee", Some("Finance"), true),
        ];
        // lead's own task counts for the department totals, f1's does not
        let all_tasks = vec![
            task_for("1", "e1", "Completed"),
            task_for("2", "e2", "Todo"),
            task_for("3", "lead", "In Progress"),
            task_for("4", "f1", "Completed"),
        ];
        let all_courses = vec![course("c1", "IT"), course("c2", "Finance")];

        let dash =
            build_team_dashboard("IT", &all_users, &all_tasks, &all_courses, &HashMap::new());

        assert_eq!(dash.department, "IT");
        assert_eq!(dash.team_members.total, 2);
        assert!(dash.team_members.list.iter().all(|m| m.user_role == "Employee"));
        assert_eq!(dash.tasks.total, 3);
        assert_eq!(dash.tasks.completed, 1);
        assert_eq!(dash.tasks.in_progress, 1);
        assert_eq!(dash.tasks.todo, 1);
        assert_eq!(dash.courses.total, 1);
        assert_eq!(dash.courses.list[0].course_id, "c1");
    }

    #[test]
    fn team_performance_ranks_members_by_overall_rating() {
        let all_users = vec![
            user("e1", "Employee", Some("IT"), true),
            user("e2", "Employee", Some("IT"), true),
        ];
        // e1: 1/3 tasks done (33.3), enrolled in 1/2 courses (50.0) -> 41.7
        // e2: 1/1 tasks done (100.0), enrolled in 0/2 courses (0.0) -> 50.0
        let all_tasks = vec![
            task_for("1", "e1", "Completed"),
            task_for("2", "e1", "Todo"),
            task_for("3", "e1", "In Progress"),
            task_for("4", "e2", "Completed"),
        ];
        let all_courses = vec![course("c1", "IT"), course("c2", "IT")];
        let enrolled: HashMap<String, u32> = [("e1".to_string(), 1)].into_iter().collect();

        let dash = build_team_dashboard("IT", &all_users, &all_tasks, &all_courses, &enrolled);

        let metrics = &dash.performance.metrics;
        assert_eq!(metrics[0].id, "e2");
        assert_eq!(metrics[0].overall_rating, 50.0);
        assert_eq!(metrics[1].id, "e1");
        assert_eq!(metrics[1].task_stats.completion_rate, 33.3);
        assert_eq!(metrics[1].course_stats.enrollment_rate, 50.0);
        assert_eq!(metrics[1].overall_rating, 41.7);
        assert_eq!(dash.performance.best_performer.as_ref().map(|m| m.id.as_str()), Some("e2"));
        assert_eq!(dash.performance.worst_performer.as_ref().map(|m| m.id.as_str()), Some("e1"));
    }

    #[test]
    fn empty_team_yields_no_performers_and_zero_rates() {
        let dash = build_team_dashboard("Sales", &[], &[], &[], &HashMap::new());
        assert!(dash.performance.metrics.is_empty());
        assert!(dash.performance.best_performer.is_none());
        assert!(dash.performance.worst_performer.is_none());
        assert_eq!(percentage(0, 0), 0.0);
    }
}
