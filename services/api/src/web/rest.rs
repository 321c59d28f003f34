//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the JSON shapes
//! and error mapping shared by every REST handler.

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use storefront_core::domain::{
    ActivityLogEntry, CustomerAggregate, CustomerProfile, DashboardSummary, Order, OrderPage,
    Product,
};
use storefront_core::ports::PortError;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{admin, auth, catalog, checkout};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        checkout::checkout_handler,
        catalog::list_products_handler,
        auth::login_handler,
        auth::logout_handler,
        admin::list_orders_handler,
        admin::update_status_handler,
        admin::verify_order_handler,
        admin::dashboard_handler,
        admin::customer_handler,
        admin::activity_handler,
    ),
    components(
        schemas(
            ErrorBody,
            checkout::CheckoutResponse,
            ProductResponse,
            OrderResponse,
            OrderPageResponse,
            CustomerResponse,
            CustomerProfileResponse,
            DashboardResponse,
            ActivityResponse,
            admin::UpdateStatusRequest,
            admin::StatusChangeResponse,
            auth::LoginRequest,
            auth::LoginResponse,
        )
    ),
    tags(
        (name = "Storefront API", description = "Checkout, catalog and order administration.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// The body of every non-success response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// What a failing handler returns.
pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn reject(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Maps a port error onto an HTTP status, keeping its message for the caller.
pub fn port_error(context: &str, e: PortError) -> HandlerError {
    let status = match &e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Validation(_) => StatusCode::BAD_REQUEST,
        PortError::InvalidTransition { .. } => StatusCode::CONFLICT,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("{}: {:?}", context, e);
    }
    let message = match e {
        PortError::Validation(message) => message,
        other => other.to_string(),
    };
    reject(status, message)
}

//=========================================================================================
// Response Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub unit_price: i64,
    pub image: String,
    pub category: Option<String>,
    pub description: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            unit_price: p.unit_price,
            image: p.image,
            category: p.category,
            description: p.description,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub items_summary: String,
    pub total_amount: i64,
    pub payment_method: String,
    pub screenshot_url: Option<String>,
    /// `pending` or `verified`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            customer_name: o.customer_name,
            email: o.email,
            phone: o.phone,
            address: o.address,
            items_summary: o.items_summary,
            total_amount: o.total_amount,
            payment_method: o.payment_method,
            screenshot_url: o.payment_proof_url,
            status: o.status.to_string(),
            created_at: o.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageResponse {
    pub orders: Vec<OrderResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub search: Option<String>,
}

impl OrderPageResponse {
    pub fn new(page: OrderPage, search: Option<String>) -> Self {
        Self {
            orders: page.orders.into_iter().map(OrderResponse::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages: page.total_pages,
            search,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub email: String,
    pub total_spent: i64,
    pub total_orders: i64,
    pub last_order_at: DateTime<Utc>,
}

impl From<CustomerAggregate> for CustomerResponse {
    fn from(c: CustomerAggregate) -> Self {
        Self {
            email: c.email,
            total_spent: c.total_spent,
            total_orders: c.total_orders,
            last_order_at: c.last_order_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileResponse {
    pub customer: CustomerResponse,
    pub orders: Vec<OrderResponse>,
}

impl From<CustomerProfile> for CustomerProfileResponse {
    fn from(p: CustomerProfile) -> Self {
        Self {
            customer: p.customer.into(),
            orders: p.orders.into_iter().map(OrderResponse::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_revenue: i64,
    pub order_count: i64,
    pub pending_count: i64,
    pub top_customers: Vec<CustomerResponse>,
}

impl From<DashboardSummary> for DashboardResponse {
    fn from(d: DashboardSummary) -> Self {
        Self {
            total_revenue: d.revenue.total_revenue,
            order_count: d.revenue.order_count,
            pending_count: d.revenue.pending_count,
            top_customers: d.top_customers.into_iter().map(CustomerResponse::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: Uuid,
    pub admin_email: String,
    pub action_type: String,
    pub details: String,
    /// `SUCCESS` or `FAILURE`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLogEntry> for ActivityResponse {
    fn from(a: ActivityLogEntry) -> Self {
        Self {
            id: a.id,
            admin_email: a.admin_email,
            action_type: a.action_type,
            details: a.details,
            status: a.status.as_str().to_string(),
            created_at: a.created_at,
        }
    }
}
