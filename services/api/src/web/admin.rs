//! services/api/src/web/admin.rs
//!
//! Handlers behind `require_admin`: the order list, status changes, the
//! dashboard, customer profiles and the activity feed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_core::domain::{AdminIdentity, OrderQuery, OrderStatus};
use storefront_core::StatusChange;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::rest::{
    port_error, reject, ActivityResponse, CustomerProfileResponse, DashboardResponse,
    HandlerError, OrderPageResponse, OrderResponse,
};
use crate::web::state::AppState;

const DEFAULT_ACTIVITY_LIMIT: u32 = 50;
const MAX_ACTIVITY_LIMIT: u32 = 200;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Case-insensitive match on customer name or email.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityParams {
    pub limit: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// `pending` or `verified`.
    pub status: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub order: OrderResponse,
    /// `NOT_SENT`, `SUCCESS` or `FAILED`.
    pub email_status: String,
    pub activity: Option<ActivityResponse>,
}

impl From<StatusChange> for StatusChangeResponse {
    fn from(change: StatusChange) -> Self {
        Self {
            order: change.order.into(),
            email_status: change.email.as_str().to_string(),
            activity: change.activity.map(ActivityResponse::from),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /admin/orders - One page of orders, newest first
#[utoipa::path(
    get,
    path = "/admin/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "A page of orders", body = OrderPageResponse),
        (status = 401, description = "Not logged in", body = crate::web::rest::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn list_orders_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<OrderPageResponse>, HandlerError> {
    let query = OrderQuery::new(params.page, params.search);
    let page = state
        .admin
        .list_orders(&query)
        .await
        .map_err(|e| port_error("Failed to list orders", e))?;
    Ok(Json(OrderPageResponse::new(page, query.search)))
}

/// POST /admin/orders/{id}/status - Move an order to a new status
#[utoipa::path(
    post,
    path = "/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "The order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = StatusChangeResponse),
        (status = 400, description = "Unknown status", body = crate::web::rest::ErrorBody),
        (status = 404, description = "Order not found", body = crate::web::rest::ErrorBody),
        (status = 409, description = "Transition not allowed", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusChangeResponse>, HandlerError> {
    let target: OrderStatus = req
        .status
        .parse()
        .map_err(|e: String| reject(StatusCode::BAD_REQUEST, e))?;
    let change = state
        .admin
        .update_status(&admin, order_id, target)
        .await
        .map_err(|e| port_error("Failed to update order status", e))?;
    Ok(Json(change.into()))
}

/// POST /admin/orders/{id}/verify - Confirm a transfer and email the customer
#[utoipa::path(
    post,
    path = "/admin/orders/{id}/verify",
    params(("id" = Uuid, Path, description = "The order id")),
    responses(
        (status = 200, description = "Order verified", body = StatusChangeResponse),
        (status = 404, description = "Order not found", body = crate::web::rest::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn verify_order_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<StatusChangeResponse>, HandlerError> {
    let change = state
        .admin
        .verify(&admin, order_id)
        .await
        .map_err(|e| port_error("Failed to verify order", e))?;
    Ok(Json(change.into()))
}

/// GET /admin/dashboard - Revenue totals and top customers
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardResponse),
        (status = 401, description = "Not logged in", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, HandlerError> {
    let summary = state
        .admin
        .dashboard()
        .await
        .map_err(|e| port_error("Failed to load dashboard", e))?;
    Ok(Json(summary.into()))
}

/// GET /admin/customers/{email} - A customer's totals and order history
#[utoipa::path(
    get,
    path = "/admin/customers/{email}",
    params(("email" = String, Path, description = "The customer's email")),
    responses(
        (status = 200, description = "Customer profile", body = CustomerProfileResponse),
        (status = 404, description = "Customer not found", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn customer_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<CustomerProfileResponse>, HandlerError> {
    let profile = state
        .admin
        .customer_profile(&email)
        .await
        .map_err(|e| port_error("Failed to load customer", e))?;
    Ok(Json(profile.into()))
}

/// GET /admin/activity - Most recent admin actions
#[utoipa::path(
    get,
    path = "/admin/activity",
    params(ActivityParams),
    responses(
        (status = 200, description = "Recent activity, newest first", body = [ActivityResponse]),
        (status = 401, description = "Not logged in", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn activity_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<ActivityResponse>>, HandlerError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let entries = state
        .admin
        .recent_activity(limit)
        .await
        .map_err(|e| port_error("Failed to load activity", e))?;
    Ok(Json(entries.into_iter().map(ActivityResponse::from).collect()))
}
