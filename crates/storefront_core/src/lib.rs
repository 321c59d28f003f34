pub mod admin;
pub mod cart;
pub mod checkout;
pub mod domain;
pub mod ingestion;
pub mod notifications;
pub mod ports;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use admin::{AdminService, StatusChange};
pub use cart::{CartStore, FileCartStorage, MemoryCartStorage};
pub use checkout::{place_order, CheckoutError, CheckoutSubmission, PaymentProof, ShippingDetails};
pub use domain::{
    ActivityLogEntry, ActivityStatus, AdminIdentity, Amount, CartEntry, CustomerAggregate,
    CustomerProfile, DashboardSummary, EmailOutcome, Order, OrderPage, OrderQuery, OrderStatus,
    Product,
};
pub use ingestion::{IngestOrderRequest, OrderIngestionService};
pub use ports::{
    ActivityLog, AdminSessionStore, CartStorage, CustomerDirectory, EmailService, OrderGateway,
    OrderRepository, PortError, PortResult, ProductCatalog, ProofStorageService,
};
