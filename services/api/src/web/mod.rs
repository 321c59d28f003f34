pub mod admin;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use self::state::AppState;

/// Payment screenshots are the largest request bodies.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the API router: public storefront routes plus the admin routes
/// guarded by `require_admin`.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/checkout", post(checkout::checkout_handler))
        .route("/products", get(catalog::list_products_handler))
        .route("/admin/login", post(auth::login_handler))
        .route("/admin/logout", post(auth::logout_handler));

    // Protected routes (admin session required)
    let protected_routes = Router::new()
        .route("/admin/orders", get(admin::list_orders_handler))
        .route("/admin/orders/{id}/status", post(admin::update_status_handler))
        .route("/admin/orders/{id}/verify", post(admin::verify_order_handler))
        .route("/admin/dashboard", get(admin::dashboard_handler))
        .route("/admin/customers/{email}", get(admin::customer_handler))
        .route("/admin/activity", get(admin::activity_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
