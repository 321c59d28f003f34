//! services/api/src/adapters/email.rs
//!
//! This module contains the adapter for the Resend email delivery API.
//! It implements the `EmailService` port.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use storefront_core::domain::EmailMessage;
use storefront_core::ports::{EmailService, PortError, PortResult};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// An adapter that sends email through Resend.
#[derive(Clone)]
pub struct ResendEmailAdapter {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl ResendEmailAdapter {
    /// Creates a new `ResendEmailAdapter` against the public Resend API.
    pub fn new(http: Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            endpoint: RESEND_API_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl EmailService for ResendEmailAdapter {
    async fn send(&self, message: EmailMessage) -> PortResult<()> {
        let body = SendEmailRequest {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "email send failed with status {status}: {text}"
            )));
        }

        Ok(())
    }
}
