//! crates/storefront_core/src/testing.rs
//!
//! In-memory implementations of the storefront ports. They back the unit tests
//! in this crate and, through the `test-util` feature, the api service's router tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    ActivityLogEntry, CustomerAggregate, EmailMessage, NewActivityLogEntry, NewOrder, Order,
    OrderPage, OrderQuery, OrderStatus, Product, RevenueSummary, MANUAL_TRANSFER,
};
use crate::ports::{
    ActivityLog, AdminSessionStore, CustomerDirectory, EmailService, OrderRepository, PortError,
    PortResult, ProductCatalog, ProofStorageService,
};

//=========================================================================================
// Orders and Customers
//=========================================================================================

/// Orders kept in insertion order. Customer aggregates are derived on read,
/// the way the database view derives them.
#[derive(Default)]
pub struct InMemoryOrders {
    orders: Mutex<Vec<Order>>,
    fail_updates: AtomicBool,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent status update fail.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Inserts an order with an explicit creation time.
    pub async fn seed(&self, order: NewOrder, created_at: DateTime<Utc>) -> Order {
        let order = build_order(order, created_at);
        self.orders.lock().await.push(order.clone());
        order
    }

    pub async fn all(&self) -> Vec<Order> {
        self.orders.lock().await.clone()
    }

    async fn newest_first(&self) -> Vec<Order> {
        let mut orders = self.orders.lock().await.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

fn build_order(order: NewOrder, created_at: DateTime<Utc>) -> Order {
    Order {
        id: Uuid::new_v4(),
        customer_name: order.customer_name,
        email: order.email,
        phone: order.phone,
        address: order.address,
        items_summary: order.items_summary,
        total_amount: order.total_amount,
        payment_method: MANUAL_TRANSFER.to_string(),
        payment_proof_url: order.payment_proof_url,
        status: OrderStatus::Pending,
        created_at,
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn insert_order(&self, order: NewOrder) -> PortResult<Order> {
        Ok(self.seed(order, Utc::now()).await)
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        allowed_from: Vec<OrderStatus>,
    ) -> PortResult<Order> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("database unavailable".to_string()));
        }
        let mut orders = self.orders.lock().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| PortError::NotFound(format!("Order {order_id} not found")))?;
        if !allowed_from.contains(&order.status) {
            return Err(PortError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }
        order.status = target;
        Ok(order.clone())
    }

    async fn get_order(&self, order_id: Uuid) -> PortResult<Order> {
        self.orders
            .lock()
            .await
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Order {order_id} not found")))
    }

    async fn list_orders(&self, query: &OrderQuery, page_size: u32) -> PortResult<OrderPage> {
        let matching: Vec<Order> = self
            .newest_first()
            .await
            .into_iter()
            .filter(|o| query.matches(o))
            .collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset(page_size)).unwrap_or(usize::MAX))
            .take(page_size as usize)
            .collect();
        Ok(OrderPage::new(page, query, page_size, total))
    }

    async fn orders_for_customer(&self, email: &str) -> PortResult<Vec<Order>> {
        Ok(self
            .newest_first()
            .await
            .into_iter()
            .filter(|o| o.email == email)
            .collect())
    }

    async fn revenue_summary(&self) -> PortResult<RevenueSummary> {
        let orders = self.orders.lock().await;
        Ok(RevenueSummary {
            total_revenue: orders.iter().map(|o| o.total_amount).sum(),
            order_count: orders.len() as i64,
            pending_count: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count() as i64,
        })
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryOrders {
    async fn top_customers(&self, limit: u32) -> PortResult<Vec<CustomerAggregate>> {
        let orders = self.orders.lock().await;
        let mut by_email: BTreeMap<&str, CustomerAggregate> = BTreeMap::new();
        for order in orders.iter() {
            let entry = by_email
                .entry(order.email.as_str())
                .or_insert_with(|| CustomerAggregate {
                    email: order.email.clone(),
                    total_spent: 0,
                    total_orders: 0,
                    last_order_at: order.created_at,
                });
            entry.total_spent += order.total_amount;
            entry.total_orders += 1;
            entry.last_order_at = entry.last_order_at.max(order.created_at);
        }
        let mut customers: Vec<CustomerAggregate> = by_email.into_values().collect();
        customers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
        customers.truncate(limit as usize);
        Ok(customers)
    }

    async fn get_customer(&self, email: &str) -> PortResult<CustomerAggregate> {
        self.top_customers(u32::MAX)
            .await?
            .into_iter()
            .find(|c| c.email == email)
            .ok_or_else(|| PortError::NotFound(format!("Customer {email} not found")))
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn list_products(&self) -> PortResult<Vec<Product>> {
        Ok(self.products.clone())
    }

    async fn products_by_ids(&self, ids: &[String]) -> PortResult<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

//=========================================================================================
// Activity Log and Admin Sessions
//=========================================================================================

#[derive(Default)]
pub struct InMemoryActivityLog {
    entries: Mutex<Vec<ActivityLogEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, entry: NewActivityLogEntry) -> PortResult<ActivityLogEntry> {
        let entry = ActivityLogEntry {
            id: Uuid::new_v4(),
            admin_email: entry.admin_email,
            action_type: entry.action_type,
            details: entry.details,
            status: entry.status,
            created_at: Utc::now(),
        };
        self.entries.lock().await.push(entry.clone());
        Ok(entry)
    }

    async fn recent(&self, limit: u32) -> PortResult<Vec<ActivityLogEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryAdminSessions {
    sessions: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl InMemoryAdminSessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminSessionStore for InMemoryAdminSessions {
    async fn create_admin_session(
        &self,
        session_id: &str,
        admin_email: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.sessions
            .lock()
            .await
            .insert(session_id.to_string(), (admin_email.to_string(), expires_at));
        Ok(())
    }

    async fn validate_admin_session(&self, session_id: &str) -> PortResult<String> {
        match self.sessions.lock().await.get(session_id) {
            Some((email, expires_at)) if *expires_at > Utc::now() => Ok(email.clone()),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_admin_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }
}

//=========================================================================================
// External Services
//=========================================================================================

/// Records every message; can be switched to fail.
#[derive(Default)]
pub struct RecordingEmail {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingEmail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let email = Self::default();
        email.failing.store(true, Ordering::SeqCst);
        email
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailService for RecordingEmail {
    async fn send(&self, message: EmailMessage) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("email provider rejected the message".to_string()));
        }
        self.sent.lock().await.push(message);
        Ok(())
    }
}

/// Keeps uploaded proofs in memory under `memory://<bucket>/<name>` URLs.
#[derive(Default)]
pub struct InMemoryProofStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl InMemoryProofStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let storage = Self::default();
        storage.failing.store(true, Ordering::SeqCst);
        storage
    }

    pub async fn object_names(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ProofStorageService for InMemoryProofStorage {
    async fn upload(
        &self,
        object_name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> PortResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("bucket unavailable".to_string()));
        }
        self.objects
            .lock()
            .await
            .insert(object_name.to_string(), bytes);
        Ok(format!("memory://payment-receipts/{object_name}"))
    }
}
