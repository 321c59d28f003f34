//! services/api/src/web/auth.rs
//!
//! Admin login and logout. A successful login stores a session row and hands
//! the browser an `admin_session` cookie.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{reject, HandlerError};
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "admin_session";
const SESSION_DAYS: i64 = 7;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub email: String,
}

/// Pulls the admin session id out of a `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .filter(|id| !id.is_empty())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /admin/login - Start an admin session
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::web::rest::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let invalid = || reject(StatusCode::UNAUTHORIZED, "Invalid email or password");
    let credentials = &state.admin_credentials;

    // 1. Check the email, then the password against the stored argon2 hash
    if !req.email.trim().eq_ignore_ascii_case(&credentials.email) {
        warn!("Admin login attempt for unknown email");
        return Err(invalid());
    }
    let parsed_hash = PasswordHash::new(&credentials.password_hash).map_err(|e| {
        error!("Failed to parse admin password hash: {:?}", e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error")
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!("Admin login with a wrong password");
        return Err(invalid());
    }

    // 2. Create the session
    let session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);
    state
        .sessions
        .create_admin_session(&session_id, &credentials.email, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create admin session: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        })?;
    info!("Admin {} logged in", credentials.email);

    // 3. Return the session cookie
    let cookie = format!(
        "{SESSION_COOKIE}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        session_id,
        Duration::days(SESSION_DAYS).num_seconds()
    );
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            email: credentials.email.clone(),
        }),
    ))
}

/// POST /admin/logout - End the admin session
#[utoipa::path(
    post,
    path = "/admin/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let session_id = session_id_from_headers(&headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "No session found"))?;

    state
        .sessions
        .delete_admin_session(session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete admin session: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout")
        })?;

    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0");
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=abc-123; other=1"),
        );
        assert_eq!(session_id_from_headers(&headers), Some("abc-123"));
    }

    #[test]
    fn similarly_named_or_empty_cookies_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("admin_session_old=x; admin_session="),
        );
        assert_eq!(session_id_from_headers(&headers), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }
}
