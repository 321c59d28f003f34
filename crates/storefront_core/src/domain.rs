//! crates/storefront_core/src/domain.rs
//!
//! Defines the pure, core data structures for the storefront.
//! These structs are independent of any database, HTTP layer or browser storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A monetary amount in whole currency units (Naira).
pub type Amount = i64;

/// Number of orders shown per page of the admin listing.
pub const ORDER_PAGE_SIZE: u32 = 10;

/// How many customers the dashboard leaderboard shows.
pub const TOP_CUSTOMER_LIMIT: u32 = 5;

/// Every order in this store is paid by manual bank transfer.
pub const MANUAL_TRANSFER: &str = "manual_transfer";

//=========================================================================================
// Catalog and Cart
//=========================================================================================

/// A product offered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub unit_price: Amount,
    pub image: String,
    pub category: Option<String>,
    pub description: String,
}

/// One line of the shopper's cart: a snapshot of the product taken when it was
/// added, plus the selected quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: String,
    pub name: String,
    pub unit_price: Amount,
    pub image: String,
    pub quantity: u32,
}

impl CartEntry {
    /// Starts a new entry for `product` with a quantity of one.
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    /// Unit price times quantity, or `None` if it does not fit in an `Amount`.
    pub fn line_total(&self) -> Option<Amount> {
        self.unit_price.checked_mul(Amount::from(self.quantity))
    }
}

/// A priced order line as reconciled on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub name: String,
    pub unit_price: Amount,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Option<Amount> {
        self.unit_price.checked_mul(Amount::from(self.quantity))
    }
}

/// Sums line totals, failing if any line or the running sum overflows.
pub fn checked_sum<I>(line_totals: I) -> Option<Amount>
where
    I: IntoIterator<Item = Option<Amount>>,
{
    line_totals
        .into_iter()
        .try_fold(0, |sum: Amount, line| sum.checked_add(line?))
}

/// Renders lines as the human-readable summary stored on an order,
/// e.g. `"1x Kit A, 2x Kit B"`.
pub fn summarize_items<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    lines
        .into_iter()
        .map(|(quantity, name)| format!("{quantity}x {name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

//=========================================================================================
// Orders
//=========================================================================================

/// The lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Verified,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Verified];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Verified => "verified",
        }
    }

    /// The transition table. Re-applying the current state is allowed so that
    /// repeated admin actions are idempotent; the only forbidden move is
    /// `verified -> pending`.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        match (self, target) {
            (OrderStatus::Pending, _) => true,
            (OrderStatus::Verified, OrderStatus::Verified) => true,
            (OrderStatus::Verified, OrderStatus::Pending) => false,
        }
    }

    /// The states an order may currently be in for a move to `target` to be accepted.
    pub fn allowed_sources(target: OrderStatus) -> Vec<OrderStatus> {
        Self::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(target))
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "verified" => Ok(OrderStatus::Verified),
            other => Err(format!("'{other}' is not a valid order status")),
        }
    }
}

/// The values written when an order is first inserted. There is no status
/// field: every new order starts out `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub items_summary: String,
    pub total_amount: Amount,
    pub payment_proof_url: Option<String>,
}

/// A durable record of a checkout submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub items_summary: String,
    pub total_amount: Amount,
    pub payment_method: String,
    pub payment_proof_url: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Admin Listing
//=========================================================================================

/// A request for one page of the admin order listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub page: u32,
    pub search: Option<String>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 1,
            search: None,
        }
    }
}

impl OrderQuery {
    /// Builds a query from raw listing parameters. Page numbers below one and
    /// blank search terms are normalised away.
    pub fn new(page: Option<u32>, search: Option<String>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            search: normalize_search(search),
        }
    }

    /// Applies a new search term. A new search always starts again at page one.
    pub fn with_search(self, term: impl Into<String>) -> Self {
        Self {
            page: 1,
            search: normalize_search(Some(term.into())),
        }
    }

    /// Rows to skip before this page. Widened so any page number is representable.
    pub fn offset(&self, page_size: u32) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(page_size)
    }

    /// Case-insensitive substring match against the customer's name or email.
    pub fn matches(&self, order: &Order) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                order.customer_name.to_lowercase().contains(&term)
                    || order.email.to_lowercase().contains(&term)
            }
        }
    }
}

fn normalize_search(search: Option<String>) -> Option<String> {
    search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// One page of the admin order listing, newest orders first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl OrderPage {
    pub fn new(orders: Vec<Order>, query: &OrderQuery, page_size: u32, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(page_size.max(1)));
        Self {
            orders,
            page: query.page,
            page_size,
            total_count,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

//=========================================================================================
// Customers and Reporting
//=========================================================================================

/// A customer's lifetime totals, derived by the database from their orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerAggregate {
    pub email: String,
    pub total_spent: Amount,
    pub total_orders: i64,
    pub last_order_at: DateTime<Utc>,
}

/// A customer's aggregate alongside their full order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerProfile {
    pub customer: CustomerAggregate,
    pub orders: Vec<Order>,
}

/// Revenue totals across every order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevenueSummary {
    pub total_revenue: Amount,
    pub order_count: i64,
    pub pending_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub revenue: RevenueSummary,
    pub top_customers: Vec<CustomerAggregate>,
}

//=========================================================================================
// Admin Activity
//=========================================================================================

/// The admin who triggered an action, as established by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub email: String,
}

/// Whether an admin action, including its side effects, went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityStatus {
    Success,
    Failure,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Success => "SUCCESS",
            ActivityStatus::Failure => "FAILURE",
        }
    }
}

impl FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(ActivityStatus::Success),
            "FAILURE" => Ok(ActivityStatus::Failure),
            other => Err(format!("'{other}' is not a valid activity status")),
        }
    }
}

/// What happened to the customer email attached to a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOutcome {
    NotSent,
    Success,
    Failed,
}

impl EmailOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailOutcome::NotSent => "NOT_SENT",
            EmailOutcome::Success => "SUCCESS",
            EmailOutcome::Failed => "FAILED",
        }
    }

    pub fn activity_status(self) -> ActivityStatus {
        match self {
            EmailOutcome::Failed => ActivityStatus::Failure,
            EmailOutcome::NotSent | EmailOutcome::Success => ActivityStatus::Success,
        }
    }
}

impl fmt::Display for EmailOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit-log entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivityLogEntry {
    pub admin_email: String,
    pub action_type: String,
    pub details: String,
    pub status: ActivityStatus,
}

/// An appended audit-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub admin_email: String,
    pub action_type: String,
    pub details: String,
    pub status: ActivityStatus,
    pub created_at: DateTime<Utc>,
}

/// An outbound email, ready for the delivery service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}
