//! crates/storefront_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the storefront's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the hosted database, object storage, email delivery and the
//! browser's storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::checkout::CheckoutSubmission;
use crate::domain::{
    ActivityLogEntry, CustomerAggregate, EmailMessage, NewActivityLogEntry, NewOrder, Order,
    OrderPage, OrderQuery, OrderStatus, Product, RevenueSummary,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order with status `pending`.
    async fn insert_order(&self, order: NewOrder) -> PortResult<Order>;

    /// Sets the status of an order, provided it is currently in one of `allowed_from`.
    ///
    /// Returns `NotFound` for an unknown id and `InvalidTransition` when the
    /// order exists but is in a state outside `allowed_from`.
    async fn update_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        allowed_from: Vec<OrderStatus>,
    ) -> PortResult<Order>;

    async fn get_order(&self, order_id: Uuid) -> PortResult<Order>;

    /// Returns one page of orders matching the query, newest first.
    async fn list_orders(&self, query: &OrderQuery, page_size: u32) -> PortResult<OrderPage>;

    async fn orders_for_customer(&self, email: &str) -> PortResult<Vec<Order>>;

    async fn revenue_summary(&self) -> PortResult<RevenueSummary>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list_products(&self) -> PortResult<Vec<Product>>;

    /// Looks up the given ids. Unknown ids are simply absent from the result.
    async fn products_by_ids(&self, ids: &[String]) -> PortResult<Vec<Product>>;
}

/// Read access to the database-maintained customer aggregates.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn top_customers(&self, limit: u32) -> PortResult<Vec<CustomerAggregate>>;

    async fn get_customer(&self, email: &str) -> PortResult<CustomerAggregate>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Appends one entry to the audit trail.
    async fn append(&self, entry: NewActivityLogEntry) -> PortResult<ActivityLogEntry>;

    async fn recent(&self, limit: u32) -> PortResult<Vec<ActivityLogEntry>>;
}

#[async_trait]
pub trait AdminSessionStore: Send + Sync {
    async fn create_admin_session(
        &self,
        session_id: &str,
        admin_email: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the admin email bound to a live session.
    async fn validate_admin_session(&self, session_id: &str) -> PortResult<String>;

    async fn delete_admin_session(&self, session_id: &str) -> PortResult<()>;
}

//=========================================================================================
// External Service Ports
//=========================================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProofStorageService: Send + Sync {
    /// Stores a payment-proof image and returns its publicly resolvable URL.
    async fn upload(&self, object_name: &str, content_type: &str, bytes: Vec<u8>)
        -> PortResult<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, message: EmailMessage) -> PortResult<()>;
}

/// The shopper-side path to the order ingestion endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submits a prepared checkout. On rejection the error carries the message
    /// the server returned.
    async fn submit(&self, submission: &CheckoutSubmission) -> Result<Uuid, String>;
}

/// Storage for the serialized cart, standing in for the browser's local storage key.
pub trait CartStorage {
    /// The raw stored value, if any.
    fn load(&self) -> Option<String>;

    fn save(&mut self, value: &str);

    fn discard(&mut self);
}
