//! services/api/src/adapters/checkout_gateway.rs
//!
//! The shopper-side HTTP client for the order ingestion endpoint. It implements the
//! `OrderGateway` port by posting the submission as one multipart request.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use storefront_core::checkout::{fields, CheckoutSubmission};
use storefront_core::ports::OrderGateway;
use uuid::Uuid;

/// Posts checkout submissions to `<base_url>/api/checkout`.
#[derive(Clone)]
pub struct HttpOrderGateway {
    http: Client,
    endpoint: String,
}

impl HttpOrderGateway {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/checkout", base_url.trim_end_matches('/')),
        }
    }

    fn build_form(submission: &CheckoutSubmission) -> Result<Form, String> {
        let items = serde_json::to_string(&submission.items).map_err(|e| e.to_string())?;
        let proof = Part::bytes(submission.proof.bytes.clone())
            .file_name(submission.proof.file_name.clone())
            .mime_str(&submission.proof.content_type)
            .map_err(|e| format!("Invalid screenshot type: {e}"))?;

        Ok(Form::new()
            .text(fields::FULL_NAME, submission.shipping.full_name.clone())
            .text(fields::EMAIL, submission.shipping.email.clone())
            .text(fields::PHONE, submission.shipping.phone.clone())
            .text(fields::ADDRESS, submission.shipping.address.clone())
            .text(fields::ITEMS, items)
            .text(fields::ITEMS_SUMMARY, submission.items_summary.clone())
            .text(fields::TOTAL, submission.total.to_string())
            .part(fields::SCREENSHOT, proof))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutReply {
    order_id: Option<Uuid>,
    error: Option<String>,
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn submit(&self, submission: &CheckoutSubmission) -> Result<Uuid, String> {
        let form = Self::build_form(submission)?;

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Could not reach the store: {e}"))?;

        let status = response.status();
        let reply: CheckoutReply = response
            .json()
            .await
            .map_err(|e| format!("Unexpected response from the store ({status}): {e}"))?;

        match (status.is_success(), reply.order_id, reply.error) {
            (true, Some(order_id), _) => Ok(order_id),
            (_, _, Some(error)) => Err(error),
            _ => Err(format!("The store could not place the order ({status}).")),
        }
    }
}
