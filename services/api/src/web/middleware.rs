//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for the admin routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use storefront_core::domain::AdminIdentity;
use tracing::debug;

use crate::web::auth::session_id_from_headers;
use crate::web::rest::{reject, HandlerError};
use crate::web::state::AppState;

/// Middleware that validates the admin session cookie.
///
/// If valid, inserts the `AdminIdentity` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let unauthorized = || reject(StatusCode::UNAUTHORIZED, "Admin login required");

    let session_id = session_id_from_headers(req.headers()).ok_or_else(unauthorized)?;

    let email = state
        .sessions
        .validate_admin_session(session_id)
        .await
        .map_err(|e| {
            debug!("Admin session rejected: {:?}", e);
            unauthorized()
        })?;

    req.extensions_mut().insert(AdminIdentity { email });
    Ok(next.run(req).await)
}
