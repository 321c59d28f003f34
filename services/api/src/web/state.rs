//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;
use storefront_core::{AdminService, AdminSessionStore, OrderIngestionService, ProductCatalog};

/// The single admin account allowed into the dashboard.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    /// An argon2 PHC string.
    pub password_hash: String,
}

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: OrderIngestionService,
    pub admin: AdminService,
    pub catalog: Arc<dyn ProductCatalog>,
    pub sessions: Arc<dyn AdminSessionStore>,
    pub admin_credentials: AdminCredentials,
}
