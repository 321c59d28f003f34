//! services/api/src/web/checkout.rs
//!
//! The order ingestion endpoint. The multipart body is decoded into a typed
//! `IngestOrderRequest` before any business logic runs.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use storefront_core::checkout::{fields, PaymentProof, SubmittedItem};
use storefront_core::ingestion::IngestOrderRequest;
use storefront_core::ports::PortError;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{port_error, reject, HandlerError};
use crate::web::state::AppState;

/// The response sent once an order has been stored.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: Uuid,
}

/// Place an order.
///
/// Accepts a multipart/form-data body with the shipping fields, the cart lines
/// as a JSON `items` field and an optional `screenshot` file.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body(content_type = "multipart/form-data", description = "Shipping details, cart lines and payment proof."),
    responses(
        (status = 200, description = "Order stored", body = CheckoutResponse),
        (status = 400, description = "The form is incomplete or invalid", body = crate::web::rest::ErrorBody),
        (status = 500, description = "Upload or database failure", body = crate::web::rest::ErrorBody)
    )
)]
pub async fn checkout_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CheckoutResponse>, HandlerError> {
    let request = read_checkout_form(multipart)
        .await
        .map_err(|message| reject(StatusCode::BAD_REQUEST, message))?;

    let order = state
        .ingestion
        .ingest(request)
        .await
        .map_err(|e| match e {
            PortError::Validation(message) => {
                warn!("Rejected checkout: {}", message);
                reject(StatusCode::BAD_REQUEST, message)
            }
            other => port_error("Failed to place order", other),
        })?;

    info!("Checkout complete for order {}", order.id);
    Ok(Json(CheckoutResponse {
        success: true,
        order_id: order.id,
    }))
}

async fn field_text(field: Field<'_>) -> Result<String, String> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| format!("Failed to read field '{}': {}", name, e))
}

/// Decodes the multipart form. Unknown fields are ignored.
async fn read_checkout_form(mut multipart: Multipart) -> Result<IngestOrderRequest, String> {
    let mut request = IngestOrderRequest::default();
    let mut items_json: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read multipart data: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            fields::FULL_NAME => request.shipping.full_name = field_text(field).await?,
            fields::EMAIL => request.shipping.email = field_text(field).await?,
            fields::PHONE => request.shipping.phone = field_text(field).await?,
            fields::ADDRESS => request.shipping.address = field_text(field).await?,
            fields::ITEMS => items_json = Some(field_text(field).await?),
            fields::ITEMS_SUMMARY => request.client_items_summary = Some(field_text(field).await?),
            fields::TOTAL => request.client_total = Some(field_text(field).await?),
            fields::SCREENSHOT => {
                let file_name = field.file_name().unwrap_or("screenshot").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read screenshot bytes: {}", e))?;
                if !bytes.is_empty() {
                    request.proof = Some(PaymentProof {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let items_json = items_json.ok_or_else(|| format!("The '{}' field is required", fields::ITEMS))?;
    request.items = serde_json::from_str::<Vec<SubmittedItem>>(&items_json)
        .map_err(|e| format!("The '{}' field is not a valid item list: {}", fields::ITEMS, e))?;

    Ok(request)
}
