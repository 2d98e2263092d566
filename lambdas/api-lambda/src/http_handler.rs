use std::env;
use std::sync::Arc;

use hrhub_atoms::{courses, notifications, sessions};
use hrhub_shared::{auth, email, stats, users, AppState};
use kanban_board::tasks;
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};

use lambda_http::http::header::{HeaderValue, SET_COOKIE, VARY};

fn with_set_cookies(mut resp: Response<Body>, cookies: &[String]) -> Response<Body> {
    let headers = resp.headers_mut();
    for cookie in cookies {
        if let Ok(v) = HeaderValue::from_str(cookie) {
            headers.append(SET_COOKIE, v);
        }
    }
    resp
}

fn with_cors_headers(mut resp: Response<Body>, request_origin: Option<&str>) -> Response<Body> {
    let cors_origin = auth::get_cors_origin(request_origin);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("https://hrhub.app")),
    );
    headers.insert(
        "Access-Control-Allow-Credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    request_origin: Option<&str>,
    cookies: &[String],
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(with_set_cookies(r, cookies), request_origin))
}

fn json_status(status: StatusCode, body: serde_json::Value) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.to_string().into())
        .map_err(Box::new)?)
}

fn not_found() -> Result<Response<Body>, Error> {
    json_status(StatusCode::NOT_FOUND, serde_json::json!({"error": "Not found"}))
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    json_status(
        StatusCode::METHOD_NOT_ALLOWED,
        serde_json::json!({"error": "Method not allowed"}),
    )
}

/// Main Lambda handler - auth endpoints are open, everything else resolves
/// the caller from the token cookies first.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body: &[u8] = event.body();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    let cookie_header = event.headers().get("Cookie").and_then(|v| v.to_str().ok());

    tracing::info!("API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, request_origin));
    }

    let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "hrhub".to_string());
    let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
    let client_secret =
        env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");

    // Auth endpoints (no cookie validation)
    if path.starts_with("/login") {
        return match method {
            &Method::POST => {
                let user_agent = event
                    .headers()
                    .get("User-Agent")
                    .and_then(|v| v.to_str().ok());
                let source_ip = event
                    .headers()
                    .get("X-Forwarded-For")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim());

                finalize_response(
                    auth::login(
                        &state.cognito_client,
                        &state.dynamo_client,
                        &table_name,
                        &client_id,
                        &client_secret,
                        body,
                        user_agent,
                        source_ip,
                    )
                    .await,
                    request_origin,
                    &[],
                )
            }
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/signup") {
        return match method {
            &Method::POST => finalize_response(
                auth::signup(
                    &state.cognito_client,
                    &state.dynamo_client,
                    &table_name,
                    &client_id,
                    &client_secret,
                    body,
                )
                .await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/refresh") {
        return match method {
            &Method::POST => finalize_response(
                auth::refresh_token(&state.cognito_client, &client_id, &client_secret, cookie_header)
                    .await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/logout") {
        return match method {
            &Method::POST => {
                // Close the caller's login sessions when the cookies still
                // resolve; an already-expired session still gets its
                // cookies cleared.
                if let Ok(ctx) = auth::authenticate_cookie_request(
                    &state.cognito_client,
                    &client_id,
                    &client_secret,
                    cookie_header,
                )
                .await
                {
                    if let Err(e) =
                        sessions::close_sessions(&state.dynamo_client, &table_name, &ctx.user_id)
                            .await
                    {
                        tracing::warn!("Failed to close sessions on logout: {}", e);
                    }
                }

                let resp = Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "application/json")
                    .header("Set-Cookie", auth::clear_cookie(auth::ACCESS_TOKEN_COOKIE))
                    .header("Set-Cookie", auth::clear_cookie(auth::REFRESH_TOKEN_COOKIE))
                    .header("Set-Cookie", auth::clear_cookie(auth::USERNAME_COOKIE))
                    .body(serde_json::json!({"message": "ok"}).to_string().into())
                    .map_err(Box::new)?;
                finalize_response(Ok(resp), request_origin, &[])
            }
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    // Everything below requires cookie auth (with auto-refresh)
    let auth_ctx = match auth::authenticate_cookie_request(
        &state.cognito_client,
        &client_id,
        &client_secret,
        cookie_header,
    )
    .await
    {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(with_cors_headers(resp, request_origin)),
    };

    // The role/department gates all read from the directory entry
    let actor = match users::get_user(&state.dynamo_client, &table_name, &auth_ctx.user_id).await? {
        Some(user) => user,
        None => {
            return finalize_response(
                json_status(
                    StatusCode::UNAUTHORIZED,
                    serde_json::json!({"error": "No directory entry for this user"}),
                ),
                request_origin,
                &auth_ctx.set_cookies,
            );
        }
    };
    if !actor.is_active {
        return finalize_response(
            json_status(
                StatusCode::FORBIDDEN,
                serde_json::json!({"error": "Account is deactivated"}),
            ),
            request_origin,
            &auth_ctx.set_cookies,
        );
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let dynamo = &state.dynamo_client;

    let resp = match (method, parts.as_slice()) {
        // --- USERS ---
        (&Method::GET, ["users"]) => users::http::list_users(dynamo, &table_name, &actor).await,
        (&Method::POST, ["users"]) => {
            users::http::create_user_handler(dynamo, &table_name, &actor, body).await
        }
        (&Method::GET, ["users", "me"]) => users::http::get_me(&actor).await,
        (&Method::PATCH, ["users", "me"]) => {
            let actor_id = actor.user_id.clone();
            users::http::update_user_handler(dynamo, &table_name, &actor, &actor_id, body).await
        }
        (&Method::GET, ["users", user_id]) => {
            match users::get_user(dynamo, &table_name, user_id).await? {
                Some(target) => {
                    let allowed = actor.user_role == "Admin"
                        || actor.user_id == target.user_id
                        || (actor.user_role == "TeamLeader"
                            && actor.department.is_some()
                            && actor.department == target.department);
                    if allowed {
                        json_status(StatusCode::OK, serde_json::to_value(&target)?)
                    } else {
                        json_status(
                            StatusCode::FORBIDDEN,
                            serde_json::json!({"error": "Forbidden"}),
                        )
                    }
                }
                None => not_found(),
            }
        }
        (&Method::PATCH, ["users", user_id]) => {
            users::http::update_user_handler(dynamo, &table_name, &actor, user_id, body).await
        }
        (&Method::DELETE, ["users", user_id]) => {
            users::http::delete_user_handler(dynamo, &table_name, &actor, user_id).await
        }
        (&Method::POST, ["users", user_id, "reset-password"]) => {
            if actor.user_role != "Admin" {
                json_status(
                    StatusCode::FORBIDDEN,
                    serde_json::json!({"error": "Forbidden"}),
                )
            } else {
                match users::get_user(dynamo, &table_name, user_id).await? {
                    Some(target) => {
                        let user_pool_id = env::var("COGNITO_USER_POOL_ID")
                            .expect("COGNITO_USER_POOL_ID must be set");
                        auth::reset_password(
                            &state.cognito_client,
                            &user_pool_id,
                            &target.user_email,
                        )
                        .await
                    }
                    None => not_found(),
                }
            }
        }

        // --- TASKS ---
        (&Method::GET, ["tasks"]) => tasks::list_tasks(dynamo, &table_name, &actor).await,
        (&Method::POST, ["tasks"]) => {
            tasks::create_task_handler(dynamo, &table_name, &actor, body).await
        }
        (&Method::GET, ["tasks", task_id]) => {
            tasks::get_task_handler(dynamo, &table_name, &actor, task_id).await
        }
        (&Method::PATCH, ["tasks", task_id]) => {
            tasks::update_task_handler(dynamo, &table_name, &actor, task_id, body).await
        }
        (&Method::DELETE, ["tasks", task_id]) => {
            tasks::delete_task_handler(dynamo, &table_name, &actor, task_id).await
        }

        // --- COURSES ---
        (&Method::GET, ["courses"]) => {
            courses::http::list_courses(dynamo, &table_name, &actor).await
        }
        (&Method::POST, ["courses"]) => {
            courses::http::create_course_handler(dynamo, &table_name, &actor, body).await
        }
        (&Method::GET, ["courses", "enrollments"]) => {
            courses::http::list_my_enrollments(dynamo, &table_name, &actor).await
        }
        (&Method::POST, ["courses", course_id, "enroll"]) => {
            courses::http::enroll_handler(dynamo, &table_name, &actor, course_id).await
        }
        (&Method::PATCH, ["courses", course_id, "progress"]) => {
            courses::http::update_progress_handler(dynamo, &table_name, &actor, course_id, body)
                .await
        }

        // --- NOTIFICATIONS ---
        (&Method::GET, ["notifications"]) => {
            notifications::http::list_notifications(dynamo, &table_name, &actor).await
        }
        (&Method::POST, ["notifications"]) => {
            notifications::http::create_notification_handler(dynamo, &table_name, &actor, body)
                .await
        }
        (&Method::PATCH, ["notifications", notification_id, "read"]) => {
            notifications::http::mark_read_handler(dynamo, &table_name, &actor, notification_id)
                .await
        }
        (&Method::DELETE, ["notifications", notification_id]) => {
            notifications::http::delete_notification_handler(
                dynamo,
                &table_name,
                &actor,
                notification_id,
            )
            .await
        }

        // --- EMAIL ---
        (&Method::POST, ["email"]) => {
            let sender =
                env::var("SES_SENDER").unwrap_or_else(|_| "noreply@hrhub.app".to_string());
            email::handle_compose(
                &state.ses_client,
                dynamo,
                &table_name,
                &sender,
                &actor,
                event.body(),
            )
            .await
        }

        // --- SESSIONS ---
        (&Method::GET, ["sessions"]) => {
            sessions::http::list_sessions(dynamo, &table_name, &actor).await
        }

        // --- DASHBOARD ---
        (&Method::GET, ["dashboard", "stats"]) => {
            stats::handle_dashboard_stats(dynamo, &table_name, &actor).await
        }
        (&Method::GET, ["dashboard", "team"]) => {
            stats::handle_team_dashboard(dynamo, &table_name, &actor).await
        }

        _ => not_found(),
    };

    finalize_response(resp, request_origin, &auth_ctx.set_cookies)
}
