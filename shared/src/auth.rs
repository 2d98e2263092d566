use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;
use sha2::Sha256;

use hrhub_atoms::sessions;
use hrhub_atoms::users;
use hrhub_atoms::users::model::CreateUserPayload;

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_TOKEN_COOKIE: &str = "hh_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "hh_refresh_token";
pub const USERNAME_COOKIE: &str = "hh_username";

const REFRESH_COOKIE_MAX_AGE: i64 = 60 * 60 * 24 * 30;

/// Origins the dashboard is served from during development and in prod
const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:8080",
    "https://hrhub.app",
];

pub fn get_cors_origin(request_origin: Option<&str>) -> String {
    match request_origin {
        Some(origin) if ALLOWED_ORIGINS.contains(&origin) => origin.to_string(),
        _ => "https://hrhub.app".to_string(),
    }
}

/// Cognito SECRET_HASH: base64(HMAC-SHA256(client_secret, username + client_id))
fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| format!("Invalid client secret: {}", e))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn build_cookie(name: &str, value: &str, max_age: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={}",
        name, value, max_age
    )
}

pub fn clear_cookie(name: &str) -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0",
        name
    )
}

fn cookie_value<'a>(cookie_header: Option<&'a str>, name: &str) -> Option<&'a str> {
    cookie_header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// The caller behind the cookies, plus any Set-Cookie headers minted by an
/// auto-refresh on the way in.
pub struct AuthContext {
    pub user_id: String,
    pub set_cookies: Vec<String>,
}

fn unauthorized(message: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({ "error": message })
                .to_string()
                .into(),
        )
        .unwrap_or_default()
}

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

/// Resolve the user id ("sub") behind an access token
async fn user_id_for_token(client: &CognitoClient, access_token: &str) -> Result<String, String> {
    let result = client
        .get_user()
        .access_token(access_token)
        .send()
        .await
        .map_err(|e| format!("Cognito get_user error: {}", e))?;

    let sub = result
        .user_attributes()
        .iter()
        .find(|a| a.name() == "sub")
        .and_then(|a| a.value())
        .map(|s| s.to_string());

    Ok(sub.unwrap_or_else(|| result.username().to_string()))
}

/// Validate the access token cookie; when it has expired, silently mint a
/// fresh one from the refresh token and hand the new cookie back to the
/// router for the response. Anything else is a 401.
pub async fn authenticate_cookie_request(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    cookie_header: Option<&str>,
) -> Result<AuthContext, Response<Body>> {
    if let Some(token) = cookie_value(cookie_header, ACCESS_TOKEN_COOKIE) {
        if let Ok(user_id) = user_id_for_token(client, token).await {
            return Ok(AuthContext {
                user_id,
                set_cookies: vec![],
            });
        }
    }

    // Access token missing or stale - try the refresh token
    let refresh = cookie_value(cookie_header, REFRESH_TOKEN_COOKIE)
        .ok_or_else(|| unauthorized("Not authenticated"))?;
    let username = cookie_value(cookie_header, USERNAME_COOKIE)
        .ok_or_else(|| unauthorized("Not authenticated"))?;

    let hash = secret_hash(username, client_id, client_secret)
        .map_err(|_| unauthorized("Not authenticated"))?;

    let result = client
        .initiate_auth()
        .auth_flow(AuthFlowType::RefreshTokenAuth)
        .client_id(client_id)
        .auth_parameters("REFRESH_TOKEN", refresh)
        .auth_parameters("SECRET_HASH", hash)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!("Token refresh failed: {}", e);
            unauthorized("Session expired")
        })?;

    let auth = result
        .authentication_result()
        .ok_or_else(|| unauthorized("Session expired"))?;
    let access_token = auth
        .access_token()
        .ok_or_else(|| unauthorized("Session expired"))?;

    let user_id = user_id_for_token(client, access_token)
        .await
        .map_err(|_| unauthorized("Session expired"))?;

    Ok(AuthContext {
        user_id,
        set_cookies: vec![build_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token,
            auth.expires_in() as i64,
        )],
    })
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// POST /login — password auth against Cognito, then the directory entry in
/// the response body and the token cookies on it. Also records a login
/// session and stamps user_last_login.
pub async fn login(
    cognito: &CognitoClient,
    dynamo: &DynamoClient,
    table_name: &str,
    client_id: &str,
    client_secret: &str,
    body: &[u8],
    user_agent: Option<&str>,
    source_ip: Option<&str>,
) -> Result<Response<Body>, Error> {
    let req: LoginRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    let hash = secret_hash(&req.email, client_id, client_secret)?;

    let result = cognito
        .initiate_auth()
        .auth_flow(AuthFlowType::UserPasswordAuth)
        .client_id(client_id)
        .auth_parameters("USERNAME", &req.email)
        .auth_parameters("PASSWORD", &req.password)
        .auth_parameters("SECRET_HASH", hash)
        .send()
        .await;

    let auth = match result {
        Ok(output) => match output.authentication_result {
            Some(auth) => auth,
            None => return json_error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
        },
        Err(e) => {
            tracing::warn!("Login rejected for {}: {}", req.email, e);
            return json_error(StatusCode::UNAUTHORIZED, "Invalid email or password");
        }
    };

    let access_token = match auth.access_token() {
        Some(t) => t.to_string(),
        None => return json_error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    };

    let user_id = user_id_for_token(cognito, &access_token)
        .await
        .map_err(Error::from)?;

    let user = match users::get_user(dynamo, table_name, &user_id).await? {
        Some(u) => u,
        None => return json_error(StatusCode::UNAUTHORIZED, "No directory entry for this user"),
    };
    if !user.is_active {
        return json_error(StatusCode::FORBIDDEN, "Account is deactivated");
    }

    users::touch_last_login(dynamo, table_name, &user_id).await;
    if let Err(e) = sessions::record_login(
        dynamo,
        table_name,
        &user_id,
        &user.user_name,
        user_agent,
        source_ip,
    )
    .await
    {
        tracing::warn!("Failed to record login session: {}", e);
    }

    tracing::info!("User {} logged in", user_id);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header(
            "Set-Cookie",
            build_cookie(ACCESS_TOKEN_COOKIE, &access_token, auth.expires_in() as i64),
        );
    if let Some(refresh) = auth.refresh_token() {
        builder = builder.header(
            "Set-Cookie",
            build_cookie(REFRESH_TOKEN_COOKIE, refresh, REFRESH_COOKIE_MAX_AGE),
        );
    }
    builder = builder.header(
        "Set-Cookie",
        build_cookie(USERNAME_COOKIE, &req.email, REFRESH_COOKIE_MAX_AGE),
    );

    Ok(builder
        .body(serde_json::to_string(&user)?.into())
        .map_err(Box::new)?)
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    user_name: String,
    department: Option<String>,
    phone_number: Option<String>,
}

/// POST /signup — create the Cognito account and its directory entry.
/// Self-signup always lands as an Employee; roles are granted by an Admin
/// afterwards.
pub async fn signup(
    cognito: &CognitoClient,
    dynamo: &DynamoClient,
    table_name: &str,
    client_id: &str,
    client_secret: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: SignupRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid body: {}", e)),
    };

    if req.email.is_empty() || !req.email.contains('@') {
        return json_error(StatusCode::BAD_REQUEST, "Please provide a valid email address");
    }

    let hash = secret_hash(&req.email, client_id, client_secret)?;

    let result = cognito
        .sign_up()
        .client_id(client_id)
        .secret_hash(hash)
        .username(&req.email)
        .password(&req.password)
        .user_attributes(
            AttributeType::builder()
                .name("email")
                .value(&req.email)
                .build()
                .map_err(Box::new)?,
        )
        .user_attributes(
            AttributeType::builder()
                .name("name")
                .value(&req.user_name)
                .build()
                .map_err(Box::new)?,
        )
        .send()
        .await;

    let user_sub = match result {
        Ok(output) => output.user_sub().to_string(),
        Err(e) => {
            tracing::warn!("Signup rejected for {}: {}", req.email, e);
            return json_error(StatusCode::BAD_REQUEST, "Could not create account");
        }
    };

    let payload = CreateUserPayload {
        user_name: req.user_name,
        user_email: req.email,
        user_role: "Employee".to_string(),
        department: req.department,
        phone_number: req.phone_number,
        profile_image: None,
        skills: vec![],
        skill_level: None,
        experience_years: None,
        description: None,
    };
    let user = users::create_user(dynamo, table_name, &user_sub, payload).await?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&user)?.into())
        .map_err(Box::new)?)
}

/// POST /refresh — explicit refresh for clients that noticed a 401
pub async fn refresh_token(
    cognito: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    cookie_header: Option<&str>,
) -> Result<Response<Body>, Error> {
    let (Some(refresh), Some(username)) = (
        cookie_value(cookie_header, REFRESH_TOKEN_COOKIE),
        cookie_value(cookie_header, USERNAME_COOKIE),
    ) else {
        return json_error(StatusCode::UNAUTHORIZED, "Not authenticated");
    };

    let hash = secret_hash(username, client_id, client_secret)?;

    let result = cognito
        .initiate_auth()
        .auth_flow(AuthFlowType::RefreshTokenAuth)
        .client_id(client_id)
        .auth_parameters("REFRESH_TOKEN", refresh)
        .auth_parameters("SECRET_HASH", hash)
        .send()
        .await;

    let auth = match result {
        Ok(output) => match output.authentication_result {
            Some(auth) => auth,
            None => return json_error(StatusCode::UNAUTHORIZED, "Session expired"),
        },
        Err(e) => {
            tracing::warn!("Token refresh failed: {}", e);
            return json_error(StatusCode::UNAUTHORIZED, "Session expired");
        }
    };

    let Some(access_token) = auth.access_token() else {
        return json_error(StatusCode::UNAUTHORIZED, "Session expired");
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header(
            "Set-Cookie",
            build_cookie(ACCESS_TOKEN_COOKIE, access_token, auth.expires_in() as i64),
        )
        .body(serde_json::json!({ "message": "ok" }).to_string().into())
        .map_err(Box::new)?)
}

/// Admin-triggered password reset: Cognito gets a fresh permanent password,
/// which is returned once in the response for the admin to hand over.
pub async fn reset_password(
    cognito: &CognitoClient,
    user_pool_id: &str,
    user_email: &str,
) -> Result<Response<Body>, Error> {
    let new_password = format!("Hr-{}!", &uuid::Uuid::new_v4().simple().to_string()[..12]);

    if let Err(e) = cognito
        .admin_set_user_password()
        .user_pool_id(user_pool_id)
        .username(user_email)
        .password(&new_password)
        .permanent(true)
        .send()
        .await
    {
        tracing::error!("Password reset failed for {}: {}", user_email, e);
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Password reset failed");
    }

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({ "message": "ok", "password": new_password })
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_parsing_tolerates_spacing() {
        let header = Some("a=1; hh_access_token=tok.en; hh_username=me@example.com");
        assert_eq!(cookie_value(header, ACCESS_TOKEN_COOKIE), Some("tok.en"));
        assert_eq!(cookie_value(header, USERNAME_COOKIE), Some("me@example.com"));
        assert_eq!(cookie_value(header, REFRESH_TOKEN_COOKIE), None);
        assert_eq!(cookie_value(None, ACCESS_TOKEN_COOKIE), None);
    }

    #[test]
    fn cors_origin_falls_back_for_unknown_origins() {
        assert_eq!(
            get_cors_origin(Some("http://localhost:5173")),
            "http://localhost:5173"
        );
        assert_eq!(get_cors_origin(Some("https://evil.example")), "https://hrhub.app");
        assert_eq!(get_cors_origin(None), "https://hrhub.app");
    }

    #[test]
    fn secret_hash_is_deterministic() {
        let a = secret_hash("user@example.com", "client", "secret").unwrap();
        let b = secret_hash("user@example.com", "client", "secret").unwrap();
        let c = secret_hash("other@example.com", "client", "secret").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
