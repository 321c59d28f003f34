//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! persistence ports from the `storefront_core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use storefront_core::domain::{
    ActivityLogEntry, ActivityStatus, CustomerAggregate, NewActivityLogEntry, NewOrder, Order,
    OrderPage, OrderQuery, OrderStatus, Product, RevenueSummary, MANUAL_TRANSFER,
};
use storefront_core::ports::{
    ActivityLog, AdminSessionStore, CustomerDirectory, OrderRepository, PortError, PortResult,
    ProductCatalog,
};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Escapes LIKE wildcards so a search term only ever matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const ORDER_COLUMNS: &str = "id, customer_name, email, phone, address, items_summary, \
     total_amount, payment_method, screenshot_url, status, created_at";

#[derive(FromRow)]
struct OrderRecord {
    id: Uuid,
    customer_name: String,
    email: String,
    phone: String,
    address: String,
    items_summary: String,
    total_amount: i64,
    payment_method: String,
    screenshot_url: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}
impl OrderRecord {
    fn to_domain(self) -> PortResult<Order> {
        let status = self.status.parse::<OrderStatus>().map_err(PortError::Unexpected)?;
        Ok(Order {
            id: self.id,
            customer_name: self.customer_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            items_summary: self.items_summary,
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            payment_proof_url: self.screenshot_url.filter(|url| !url.is_empty()),
            status,
            created_at: self.created_at,
        })
    }
}

fn orders_to_domain(records: Vec<OrderRecord>) -> PortResult<Vec<Order>> {
    records.into_iter().map(OrderRecord::to_domain).collect()
}

#[derive(FromRow)]
struct ProductRecord {
    id: String,
    name: String,
    unit_price: i64,
    image: String,
    category: Option<String>,
    description: String,
}
impl ProductRecord {
    fn to_domain(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            unit_price: self.unit_price,
            image: self.image,
            category: self.category,
            description: self.description,
        }
    }
}

#[derive(FromRow)]
struct CustomerRecord {
    email: String,
    total_spent: i64,
    total_orders: i64,
    last_order_at: DateTime<Utc>,
}
impl CustomerRecord {
    fn to_domain(self) -> CustomerAggregate {
        CustomerAggregate {
            email: self.email,
            total_spent: self.total_spent,
            total_orders: self.total_orders,
            last_order_at: self.last_order_at,
        }
    }
}

#[derive(FromRow)]
struct RevenueRecord {
    total_revenue: i64,
    order_count: i64,
    pending_count: i64,
}

#[derive(FromRow)]
struct ActivityRecord {
    id: Uuid,
    admin_email: String,
    action_type: String,
    details: String,
    status: String,
    created_at: DateTime<Utc>,
}
impl ActivityRecord {
    fn to_domain(self) -> PortResult<ActivityLogEntry> {
        let status = self
            .status
            .parse::<ActivityStatus>()
            .map_err(PortError::Unexpected)?;
        Ok(ActivityLogEntry {
            id: self.id,
            admin_email: self.admin_email,
            action_type: self.action_type,
            details: self.details,
            status,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `OrderRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl OrderRepository for DbAdapter {
    async fn insert_order(&self, order: NewOrder) -> PortResult<Order> {
        let sql = format!(
            "INSERT INTO orders (id, customer_name, email, phone, address, items_summary, \
             total_amount, payment_method, screenshot_url, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {ORDER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(order.customer_name)
            .bind(order.email)
            .bind(order.phone)
            .bind(order.address)
            .bind(order.items_summary)
            .bind(order.total_amount)
            .bind(MANUAL_TRANSFER)
            .bind(order.payment_proof_url)
            .bind(OrderStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.to_domain()
    }

    async fn update_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        allowed_from: Vec<OrderStatus>,
    ) -> PortResult<Order> {
        let allowed: Vec<String> = allowed_from
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();
        let sql = format!(
            "UPDATE orders SET status = $1 WHERE id = $2 AND status = ANY($3) RETURNING {ORDER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(target.as_str())
            .bind(order_id)
            .bind(allowed)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        if let Some(record) = updated {
            return record.to_domain();
        }

        // Nothing changed: either the order is missing or it is in a state the
        // transition table does not allow moving from.
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        match current {
            None => Err(PortError::NotFound(format!("Order {} not found", order_id))),
            Some(status) => Err(PortError::InvalidTransition {
                from: status.parse().map_err(PortError::Unexpected)?,
                to: target,
            }),
        }
    }

    async fn get_order(&self, order_id: Uuid) -> PortResult<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let record = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(order_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Order {} not found", order_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        record.to_domain()
    }

    async fn list_orders(&self, query: &OrderQuery, page_size: u32) -> PortResult<OrderPage> {
        let pattern = query.search.as_deref().map(like_pattern);
        let filter = "($1::TEXT IS NULL OR customer_name ILIKE $1 OR email ILIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {filter}"))
            .bind(pattern.clone())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let records = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(pattern)
            .bind(i64::from(page_size))
            .bind(i64::try_from(query.offset(page_size)).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let orders = orders_to_domain(records)?;
        Ok(OrderPage::new(
            orders,
            query,
            page_size,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn orders_for_customer(&self, email: &str) -> PortResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE email = $1 ORDER BY created_at DESC"
        );
        let records = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        orders_to_domain(records)
    }

    async fn revenue_summary(&self) -> PortResult<RevenueSummary> {
        let record = sqlx::query_as::<_, RevenueRecord>(
            "SELECT COALESCE(SUM(total_amount), 0)::BIGINT AS total_revenue, \
             COUNT(*) AS order_count, \
             COUNT(*) FILTER (WHERE status = 'pending') AS pending_count \
             FROM orders",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(RevenueSummary {
            total_revenue: record.total_revenue,
            order_count: record.order_count,
            pending_count: record.pending_count,
        })
    }
}

//=========================================================================================
// `ProductCatalog` and `CustomerDirectory` Trait Implementations
//=========================================================================================

#[async_trait]
impl ProductCatalog for DbAdapter {
    async fn list_products(&self) -> PortResult<Vec<Product>> {
        let records = sqlx::query_as::<_, ProductRecord>(
            "SELECT id, name, unit_price, image, category, description FROM products ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn products_by_ids(&self, ids: &[String]) -> PortResult<Vec<Product>> {
        let records = sqlx::query_as::<_, ProductRecord>(
            "SELECT id, name, unit_price, image, category, description FROM products WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

#[async_trait]
impl CustomerDirectory for DbAdapter {
    async fn top_customers(&self, limit: u32) -> PortResult<Vec<CustomerAggregate>> {
        let records = sqlx::query_as::<_, CustomerRecord>(
            "SELECT email, total_spent, total_orders, last_order_at FROM customers \
             ORDER BY total_spent DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_customer(&self, email: &str) -> PortResult<CustomerAggregate> {
        let record = sqlx::query_as::<_, CustomerRecord>(
            "SELECT email, total_spent, total_orders, last_order_at FROM customers WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Customer {} not found", email)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `ActivityLog` and `AdminSessionStore` Trait Implementations
//=========================================================================================

#[async_trait]
impl ActivityLog for DbAdapter {
    async fn append(&self, entry: NewActivityLogEntry) -> PortResult<ActivityLogEntry> {
        let record = sqlx::query_as::<_, ActivityRecord>(
            "INSERT INTO activity_logs (id, admin_email, action_type, details, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, admin_email, action_type, details, status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(entry.admin_email)
        .bind(entry.action_type)
        .bind(entry.details)
        .bind(entry.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn recent(&self, limit: u32) -> PortResult<Vec<ActivityLogEntry>> {
        let records = sqlx::query_as::<_, ActivityRecord>(
            "SELECT id, admin_email, action_type, details, status, created_at FROM activity_logs \
             ORDER BY created_at DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(ActivityRecord::to_domain).collect()
    }
}

#[async_trait]
impl AdminSessionStore for DbAdapter {
    async fn create_admin_session(
        &self,
        session_id: &str,
        admin_email: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO admin_sessions (id, admin_email, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(admin_email)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_admin_session(&self, session_id: &str) -> PortResult<String> {
        let email: Option<String> = sqlx::query_scalar(
            "SELECT admin_email FROM admin_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        email.ok_or(PortError::Unauthorized)
    }

    async fn delete_admin_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
