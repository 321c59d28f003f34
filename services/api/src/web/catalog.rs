//! services/api/src/web/catalog.rs
//!
//! The public product catalog.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::rest::{port_error, HandlerError, ProductResponse};
use crate::web::state::AppState;

/// List every product in the catalog.
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "The catalog", body = [ProductResponse]),
        (status = 500, description = "Internal server error", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn list_products_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductResponse>>, HandlerError> {
    let products = state
        .catalog
        .list_products()
        .await
        .map_err(|e| port_error("Failed to list products", e))?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}
