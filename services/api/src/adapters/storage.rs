//! services/api/src/adapters/storage.rs
//!
//! This module contains the adapter for the hosted object storage bucket that keeps
//! payment-proof screenshots. It implements the `ProofStorageService` port.

use async_trait::async_trait;
use reqwest::{header, Client};
use storefront_core::ports::{PortError, PortResult, ProofStorageService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that uploads proofs to a Supabase Storage bucket over its REST API.
#[derive(Clone)]
pub struct SupabaseStorageAdapter {
    http: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorageAdapter {
    /// Creates a new `SupabaseStorageAdapter`.
    pub fn new(http: Client, base_url: &str, service_key: String, bucket: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    /// The public URL an uploaded object is served from.
    pub fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, object_name
        )
    }
}

//=========================================================================================
// `ProofStorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProofStorageService for SupabaseStorageAdapter {
    async fn upload(
        &self,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> PortResult<String> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, object_name
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "proof upload failed with status {status}: {text}"
            )));
        }

        Ok(self.public_url(object_name))
    }
}
