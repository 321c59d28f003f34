//! crates/storefront_core/src/admin.rs
//!
//! The admin side of the order lifecycle: listing orders, the dashboard
//! figures, customer profiles and the `pending -> verified` transition.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    ActivityLogEntry, AdminIdentity, CustomerProfile, DashboardSummary, EmailOutcome,
    NewActivityLogEntry, Order, OrderPage, OrderQuery, OrderStatus, ORDER_PAGE_SIZE,
    TOP_CUSTOMER_LIMIT,
};
use crate::notifications::{payment_confirmation, NotificationSettings};
use crate::ports::{ActivityLog, CustomerDirectory, EmailService, OrderRepository, PortResult};

pub const VERIFY_ORDER_ACTION: &str = "VERIFY_ORDER";
pub const UPDATE_STATUS_ACTION: &str = "UPDATE_ORDER_STATUS";

/// The result of one status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub order: Order,
    pub email: EmailOutcome,
    /// The audit entry, if appending it succeeded.
    pub activity: Option<ActivityLogEntry>,
}

#[derive(Clone)]
pub struct AdminService {
    orders: Arc<dyn OrderRepository>,
    customers: Arc<dyn CustomerDirectory>,
    activity: Arc<dyn ActivityLog>,
    email: Arc<dyn EmailService>,
    notifications: NotificationSettings,
}

impl AdminService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        customers: Arc<dyn CustomerDirectory>,
        activity: Arc<dyn ActivityLog>,
        email: Arc<dyn EmailService>,
        notifications: NotificationSettings,
    ) -> Self {
        Self {
            orders,
            customers,
            activity,
            email,
            notifications,
        }
    }

    /// Marks an order's transfer as received.
    pub async fn verify(&self, admin: &AdminIdentity, order_id: Uuid) -> PortResult<StatusChange> {
        self.update_status(admin, order_id, OrderStatus::Verified)
            .await
    }

    /// Moves an order to `target`.
    ///
    /// The row update must succeed first; if it fails nothing else happens.
    /// After it, a move to `verified` emails the customer, and exactly one
    /// activity entry records the outcome. A failed email is recorded, never
    /// rolled back.
    pub async fn update_status(
        &self,
        admin: &AdminIdentity,
        order_id: Uuid,
        target: OrderStatus,
    ) -> PortResult<StatusChange> {
        let order = self
            .orders
            .update_order_status(order_id, target, OrderStatus::allowed_sources(target))
            .await?;
        info!("{} set order {} to {}", admin.email, order.id, order.status);

        let email = if order.status == OrderStatus::Verified {
            let message = payment_confirmation(&self.notifications, &order);
            match self.email.send(message).await {
                Ok(()) => EmailOutcome::Success,
                Err(e) => {
                    warn!("Confirmation email for order {} failed: {}", order.id, e);
                    EmailOutcome::Failed
                }
            }
        } else {
            EmailOutcome::NotSent
        };

        let (action_type, verb) = match target {
            OrderStatus::Verified => (VERIFY_ORDER_ACTION, "Verified".to_string()),
            other => (UPDATE_STATUS_ACTION, format!("Set to {other}")),
        };
        let entry = NewActivityLogEntry {
            admin_email: admin.email.clone(),
            action_type: action_type.to_string(),
            details: format!(
                "{verb} order {} for {}. Email: {email}",
                order.id, order.customer_name
            ),
            status: email.activity_status(),
        };
        let activity = match self.activity.append(entry).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!("Failed to record activity for order {}: {}", order.id, e);
                None
            }
        };

        Ok(StatusChange {
            order,
            email,
            activity,
        })
    }

    pub async fn list_orders(&self, query: &OrderQuery) -> PortResult<OrderPage> {
        self.orders.list_orders(query, ORDER_PAGE_SIZE).await
    }

    pub async fn dashboard(&self) -> PortResult<DashboardSummary> {
        let revenue = self.orders.revenue_summary().await?;
        let top_customers = self.customers.top_customers(TOP_CUSTOMER_LIMIT).await?;
        Ok(DashboardSummary {
            revenue,
            top_customers,
        })
    }

    pub async fn customer_profile(&self, email: &str) -> PortResult<CustomerProfile> {
        let customer = self.customers.get_customer(email).await?;
        let orders = self.orders.orders_for_customer(email).await?;
        Ok(CustomerProfile { customer, orders })
    }

    pub async fn recent_activity(&self, limit: u32) -> PortResult<Vec<ActivityLogEntry>> {
        self.activity.recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityStatus, NewOrder};
    use crate::ports::{MockActivityLog, MockEmailService, PortError};
    use crate::testing::{InMemoryActivityLog, InMemoryOrders, RecordingEmail};
    use chrono::{Duration, Utc};
    use testresult::TestResult;

    fn settings() -> NotificationSettings {
        NotificationSettings {
            orders_from: "orders@example.com".to_string(),
            confirmation_from: "hello@example.com".to_string(),
            operator_email: "owner@example.com".to_string(),
            site_url: "https://shop.example.com".to_string(),
            store_name: "Shapes Online".to_string(),
        }
    }

    fn admin() -> AdminIdentity {
        AdminIdentity {
            email: "admin@example.com".to_string(),
        }
    }

    fn new_order(name: &str, email: &str, total_amount: i64) -> NewOrder {
        NewOrder {
            customer_name: name.to_string(),
            email: email.to_string(),
            phone: "080".to_string(),
            address: "Lagos".to_string(),
            items_summary: "1x Kit A".to_string(),
            total_amount,
            payment_proof_url: None,
        }
    }

    struct Harness {
        orders: Arc<InMemoryOrders>,
        activity: Arc<InMemoryActivityLog>,
        email: Arc<RecordingEmail>,
        service: AdminService,
    }

    fn harness(email: RecordingEmail) -> Harness {
        let orders = Arc::new(InMemoryOrders::new());
        let activity = Arc::new(InMemoryActivityLog::new());
        let email = Arc::new(email);
        let service = AdminService::new(
            orders.clone(),
            orders.clone(),
            activity.clone(),
            email.clone(),
            settings(),
        );
        Harness {
            orders,
            activity,
            email,
            service,
        }
    }

    #[tokio::test]
    async fn verify_transitions_and_logs_once() -> TestResult {
        let h = harness(RecordingEmail::new());
        let order = h
            .orders
            .seed(new_order("Jane", "jane@example.com", 112_500), Utc::now())
            .await;

        let change = h.service.verify(&admin(), order.id).await?;

        assert_eq!(change.order.status, OrderStatus::Verified);
        assert_eq!(change.email, EmailOutcome::Success);
        let log = h.activity.entries().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action_type, VERIFY_ORDER_ACTION);
        assert_eq!(log[0].admin_email, "admin@example.com");
        assert_eq!(log[0].status, ActivityStatus::Success);
        assert!(log[0].details.contains(&order.id.to_string()));
        assert!(log[0].details.ends_with("Email: SUCCESS"));

        let sent = h.email.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert!(sent[0].html.contains("₦112,500"));
        Ok(())
    }

    #[tokio::test]
    async fn email_failure_is_recorded_but_status_sticks() -> TestResult {
        let h = harness(RecordingEmail::failing());
        let order = h
            .orders
            .seed(new_order("Jane", "jane@example.com", 5_000), Utc::now())
            .await;

        let change = h.service.verify(&admin(), order.id).await?;

        assert_eq!(change.email, EmailOutcome::Failed);
        assert_eq!(h.orders.get_order(order.id).await?.status, OrderStatus::Verified);
        let log = h.activity.entries().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, ActivityStatus::Failure);
        assert!(log[0].details.ends_with("Email: FAILED"));
        Ok(())
    }

    #[tokio::test]
    async fn verifying_twice_is_idempotent() -> TestResult {
        let h = harness(RecordingEmail::new());
        let order = h
            .orders
            .seed(new_order("Jane", "jane@example.com", 5_000), Utc::now())
            .await;

        h.service.verify(&admin(), order.id).await?;
        let second = h.service.verify(&admin(), order.id).await?;

        assert_eq!(second.order.status, OrderStatus::Verified);
        assert_eq!(h.activity.entries().await.len(), 2);
        assert_eq!(h.email.sent().await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn moving_a_verified_order_back_is_rejected_without_side_effects() -> TestResult {
        let h = harness(RecordingEmail::new());
        let order = h
            .orders
            .seed(new_order("Jane", "jane@example.com", 5_000), Utc::now())
            .await;
        h.service.verify(&admin(), order.id).await?;

        let result = h
            .service
            .update_status(&admin(), order.id, OrderStatus::Pending)
            .await;

        assert!(matches!(
            result,
            Err(PortError::InvalidTransition {
                from: OrderStatus::Verified,
                to: OrderStatus::Pending
            })
        ));
        assert_eq!(h.activity.entries().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn pending_to_pending_sends_nothing_but_is_logged() -> TestResult {
        let h = harness(RecordingEmail::new());
        let order = h
            .orders
            .seed(new_order("Jane", "jane@example.com", 5_000), Utc::now())
            .await;

        let change = h
            .service
            .update_status(&admin(), order.id, OrderStatus::Pending)
            .await?;

        assert_eq!(change.email, EmailOutcome::NotSent);
        assert!(h.email.sent().await.is_empty());
        let log = h.activity.entries().await;
        assert_eq!(log[0].action_type, UPDATE_STATUS_ACTION);
        Ok(())
    }

    #[tokio::test]
    async fn update_failure_aborts_before_email_and_log() {
        let h = harness(RecordingEmail::new());
        let order = h
            .orders
            .seed(new_order("Jane", "jane@example.com", 5_000), Utc::now())
            .await;
        h.orders.fail_updates(true);

        let result = h.service.verify(&admin(), order.id).await;

        assert!(result.is_err());
        assert!(h.email.sent().await.is_empty());
        assert!(h.activity.entries().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let h = harness(RecordingEmail::new());
        let result = h.service.verify(&admin(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn log_failure_does_not_undo_the_verification() -> TestResult {
        let orders = Arc::new(InMemoryOrders::new());
        let order = orders
            .seed(new_order("Jane", "jane@example.com", 5_000), Utc::now())
            .await;
        let mut activity = MockActivityLog::new();
        activity
            .expect_append()
            .times(1)
            .returning(|_| Err(PortError::Unexpected("log table locked".to_string())));
        let mut email = MockEmailService::new();
        email.expect_send().times(1).returning(|_| Ok(()));

        let service = AdminService::new(
            orders.clone(),
            orders.clone(),
            Arc::new(activity),
            Arc::new(email),
            settings(),
        );

        let change = service.verify(&admin(), order.id).await?;
        assert_eq!(change.activity, None);
        assert_eq!(orders.get_order(order.id).await?.status, OrderStatus::Verified);
        Ok(())
    }

    #[tokio::test]
    async fn search_matches_name_or_email_case_insensitively() -> TestResult {
        let h = harness(RecordingEmail::new());
        let now = Utc::now();
        h.orders
            .seed(new_order("Jane Doe", "jd@example.com", 1_000), now)
            .await;
        h.orders
            .seed(new_order("Bob", "JANE.b@example.com", 1_000), now)
            .await;
        h.orders
            .seed(new_order("Ada", "ada@example.com", 1_000), now)
            .await;

        let query = OrderQuery::new(Some(3), None).with_search("jane");
        let page = h.service.list_orders(&query).await?;

        assert_eq!(page.page, 1);
        assert_eq!(page.total_count, 2);
        assert!(page
            .orders
            .iter()
            .all(|o| o.customer_name.to_lowercase().contains("jane")
                || o.email.to_lowercase().contains("jane")));
        Ok(())
    }

    #[tokio::test]
    async fn listing_pages_newest_first() -> TestResult {
        let h = harness(RecordingEmail::new());
        let start = Utc::now();
        for i in 0..12 {
            h.orders
                .seed(
                    new_order(&format!("Customer {i}"), &format!("c{i}@example.com"), 1_000),
                    start + Duration::minutes(i),
                )
                .await;
        }

        let first = h.service.list_orders(&OrderQuery::default()).await?;
        assert_eq!(first.orders.len(), ORDER_PAGE_SIZE as usize);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.orders[0].customer_name, "Customer 11");

        let second = h.service.list_orders(&OrderQuery::new(Some(2), None)).await?;
        assert_eq!(second.orders.len(), 2);
        assert_eq!(second.orders[1].customer_name, "Customer 0");
        Ok(())
    }

    #[tokio::test]
    async fn dashboard_and_profile_read_the_aggregates() -> TestResult {
        let h = harness(RecordingEmail::new());
        let now = Utc::now();
        h.orders
            .seed(new_order("Jane", "jane@example.com", 10_000), now)
            .await;
        h.orders
            .seed(
                new_order("Jane", "jane@example.com", 20_000),
                now + Duration::minutes(1),
            )
            .await;
        h.orders
            .seed(new_order("Ada", "ada@example.com", 5_000), now)
            .await;

        let dashboard = h.service.dashboard().await?;
        assert_eq!(dashboard.revenue.total_revenue, 35_000);
        assert_eq!(dashboard.revenue.order_count, 3);
        assert_eq!(dashboard.revenue.pending_count, 3);
        assert_eq!(dashboard.top_customers[0].email, "jane@example.com");
        assert_eq!(dashboard.top_customers[0].total_spent, 30_000);

        let profile = h.service.customer_profile("jane@example.com").await?;
        assert_eq!(profile.customer.total_orders, 2);
        assert_eq!(profile.orders.len(), 2);
        assert_eq!(profile.orders[0].total_amount, 20_000);

        assert!(matches!(
            h.service.customer_profile("nobody@example.com").await,
            Err(PortError::NotFound(_))
        ));
        Ok(())
    }
}
