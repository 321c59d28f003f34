//! crates/storefront_core/src/ingestion.rs
//!
//! The only server-side write path for new orders.
//!
//! The server re-prices every submitted line from the catalog. The summary and
//! total the shopper's browser computed are kept for comparison only.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::checkout::{PaymentProof, ShippingDetails, SubmittedItem};
use crate::domain::{checked_sum, summarize_items, Amount, NewOrder, Order, OrderLine};
use crate::notifications::{new_order_notice, NotificationSettings};
use crate::ports::{
    EmailService, OrderRepository, PortError, PortResult, ProductCatalog, ProofStorageService,
};

/// A checkout request as received at the boundary, already decoded into typed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOrderRequest {
    pub shipping: ShippingDetails,
    pub items: Vec<SubmittedItem>,
    /// The summary the browser showed the shopper.
    pub client_items_summary: Option<String>,
    /// The total the browser showed the shopper, as sent.
    pub client_total: Option<String>,
    pub proof: Option<PaymentProof>,
}

#[derive(Clone)]
pub struct OrderIngestionService {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    storage: Arc<dyn ProofStorageService>,
    email: Arc<dyn EmailService>,
    notifications: NotificationSettings,
    delivery_fee: Amount,
}

impl OrderIngestionService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        storage: Arc<dyn ProofStorageService>,
        email: Arc<dyn EmailService>,
        notifications: NotificationSettings,
        delivery_fee: Amount,
    ) -> Self {
        Self {
            orders,
            catalog,
            storage,
            email,
            notifications,
            delivery_fee,
        }
    }

    /// Validates, prices and stores an order, then tells the operator about it.
    ///
    /// A failed proof upload fails the whole request before anything is written.
    /// A failed notification does not: the order is already stored.
    pub async fn ingest(&self, request: IngestOrderRequest) -> PortResult<Order> {
        request.shipping.validate().map_err(PortError::Validation)?;
        let lines = self.price_lines(&request.items).await?;

        let items_summary =
            summarize_items(lines.iter().map(|line| (line.quantity, line.name.as_str())));
        let total_amount = checked_sum(lines.iter().map(OrderLine::line_total))
            .and_then(|subtotal| subtotal.checked_add(self.delivery_fee))
            .ok_or_else(|| PortError::Validation("The order total is too large.".to_string()))?;
        warn_on_client_mismatch(&request, &items_summary, total_amount);

        let payment_proof_url = match request.proof.filter(|p| !p.is_empty()) {
            Some(proof) => Some(self.store_proof(proof).await?),
            None => None,
        };

        let shipping = request.shipping.trimmed();
        let order = self
            .orders
            .insert_order(NewOrder {
                customer_name: shipping.full_name,
                email: shipping.email,
                phone: shipping.phone,
                address: shipping.address,
                items_summary,
                total_amount,
                payment_proof_url,
            })
            .await?;
        info!("Stored order {} for {}", order.id, order.email);

        let notice = new_order_notice(&self.notifications, &order);
        if let Err(e) = self.email.send(notice).await {
            warn!("Operator notification for order {} failed: {}", order.id, e);
        }

        Ok(order)
    }

    /// Prices the submitted lines against the catalog, merging repeated products.
    async fn price_lines(&self, items: &[SubmittedItem]) -> PortResult<Vec<OrderLine>> {
        if items.is_empty() {
            return Err(PortError::Validation("The order has no items.".to_string()));
        }

        let mut merged: Vec<SubmittedItem> = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity < 1 {
                return Err(PortError::Validation(format!(
                    "Quantity for product {} must be at least 1.",
                    item.product_id
                )));
            }
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or_else(|| {
                            PortError::Validation(format!(
                                "Quantity for product {} is too large.",
                                item.product_id
                            ))
                        })?;
                }
                None => merged.push(item.clone()),
            }
        }

        let ids: Vec<String> = merged.iter().map(|m| m.product_id.clone()).collect();
        let products = self.catalog.products_by_ids(&ids).await?;

        merged
            .into_iter()
            .map(|item| {
                let product = products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .ok_or_else(|| {
                        PortError::Validation(format!("Unknown product: {}", item.product_id))
                    })?;
                Ok(OrderLine {
                    name: product.name.clone(),
                    unit_price: product.unit_price,
                    quantity: item.quantity,
                })
            })
            .collect()
    }

    async fn store_proof(&self, proof: PaymentProof) -> PortResult<String> {
        let object_name = proof_object_name(proof.extension());
        let url = self
            .storage
            .upload(&object_name, &proof.content_type, proof.bytes)
            .await?;
        info!("Stored payment proof as {}", object_name);
        Ok(url)
    }
}

/// A unique object name: `<unix millis>_<8 random hex>.<ext>`.
pub fn proof_object_name(extension: Option<&str>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    let suffix: String = random.chars().take(8).collect();
    let ext = extension
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
        .to_ascii_lowercase();
    format!("{}_{}.{}", Utc::now().timestamp_millis(), suffix, ext)
}

fn warn_on_client_mismatch(request: &IngestOrderRequest, summary: &str, total: Amount) {
    if let Some(client_summary) = &request.client_items_summary {
        if client_summary.trim() != summary {
            warn!(
                "Client items summary '{}' differs from server summary '{}'",
                client_summary, summary
            );
        }
    }
    if let Some(client_total) = &request.client_total {
        let matches = client_total
            .trim()
            .parse::<f64>()
            .is_ok_and(|value| (value - total as f64).abs() < 0.005);
        if !matches {
            warn!(
                "Client total '{}' differs from server total {}",
                client_total, total
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderStatus, Product};
    use crate::ports::{MockEmailService, MockOrderRepository, MockProofStorageService};
    use crate::testing::{InMemoryCatalog, InMemoryOrders, InMemoryProofStorage, RecordingEmail};
    use testresult::TestResult;

    fn catalog() -> Arc<InMemoryCatalog> {
        let product = |id: &str, name: &str, unit_price| Product {
            id: id.to_string(),
            name: name.to_string(),
            unit_price,
            image: String::new(),
            category: None,
            description: String::new(),
        };
        Arc::new(InMemoryCatalog::new(vec![
            product("kit-a", "Kit A", 50_000),
            product("kit-b", "Kit B", 30_000),
        ]))
    }

    fn settings() -> NotificationSettings {
        NotificationSettings {
            orders_from: "orders@example.com".to_string(),
            confirmation_from: "hello@example.com".to_string(),
            operator_email: "owner@example.com".to_string(),
            site_url: "https://shop.example.com".to_string(),
            store_name: "Shapes Online".to_string(),
        }
    }

    fn request(proof: bool) -> IngestOrderRequest {
        IngestOrderRequest {
            shipping: ShippingDetails {
                full_name: " Jane Doe ".to_string(),
                email: "jane@example.com".to_string(),
                phone: "080".to_string(),
                address: "Lagos".to_string(),
            },
            items: vec![
                SubmittedItem {
                    product_id: "kit-a".to_string(),
                    quantity: 1,
                },
                SubmittedItem {
                    product_id: "kit-b".to_string(),
                    quantity: 2,
                },
            ],
            client_items_summary: Some("1x Kit A, 2x Kit B".to_string()),
            client_total: Some("1".to_string()),
            proof: proof.then(|| PaymentProof {
                file_name: "proof.JPG".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: vec![1, 2, 3],
            }),
        }
    }

    struct Harness {
        orders: Arc<InMemoryOrders>,
        storage: Arc<InMemoryProofStorage>,
        email: Arc<RecordingEmail>,
        service: OrderIngestionService,
    }

    fn harness(storage: InMemoryProofStorage, email: RecordingEmail) -> Harness {
        let orders = Arc::new(InMemoryOrders::new());
        let storage = Arc::new(storage);
        let email = Arc::new(email);
        let service = OrderIngestionService::new(
            orders.clone(),
            catalog(),
            storage.clone(),
            email.clone(),
            settings(),
            2_500,
        );
        Harness {
            orders,
            storage,
            email,
            service,
        }
    }

    #[tokio::test]
    async fn ingest_prices_on_the_server_and_stores_a_pending_order() -> TestResult {
        let h = harness(InMemoryProofStorage::new(), RecordingEmail::new());

        let order = h.service.ingest(request(true)).await?;

        assert_eq!(order.total_amount, 112_500);
        assert_eq!(order.items_summary, "1x Kit A, 2x Kit B");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer_name, "Jane Doe");
        let url = order.payment_proof_url.clone().ok_or("proof url missing")?;
        assert!(url.ends_with(".jpg"), "unexpected proof url {url}");
        assert_eq!(h.storage.object_names().await.len(), 1);
        assert_eq!(h.orders.all().await, vec![order]);

        let sent = h.email.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn ingest_without_proof_stores_no_url() -> TestResult {
        let h = harness(InMemoryProofStorage::new(), RecordingEmail::new());
        let order = h.service.ingest(request(false)).await?;
        assert_eq!(order.payment_proof_url, None);
        Ok(())
    }

    #[tokio::test]
    async fn upload_failure_creates_no_order() {
        let h = harness(InMemoryProofStorage::failing(), RecordingEmail::new());

        let result = h.service.ingest(request(true)).await;

        assert!(matches!(result, Err(PortError::Unexpected(_))));
        assert!(h.orders.all().await.is_empty());
        assert!(h.email.sent().await.is_empty());
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_order() -> TestResult {
        let h = harness(InMemoryProofStorage::new(), RecordingEmail::failing());
        let order = h.service.ingest(request(true)).await?;
        assert_eq!(h.orders.all().await, vec![order]);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_products_are_rejected_before_upload() {
        let h = harness(InMemoryProofStorage::new(), RecordingEmail::new());
        let mut req = request(true);
        req.items.push(SubmittedItem {
            product_id: "ghost".to_string(),
            quantity: 1,
        });

        let result = h.service.ingest(req).await;

        assert!(matches!(result, Err(PortError::Validation(ref m)) if m.contains("ghost")));
        assert!(h.storage.object_names().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_products_are_merged() -> TestResult {
        let h = harness(InMemoryProofStorage::new(), RecordingEmail::new());
        let mut req = request(false);
        req.items.push(SubmittedItem {
            product_id: "kit-a".to_string(),
            quantity: 1,
        });

        let order = h.service.ingest(req).await?;

        assert_eq!(order.items_summary, "2x Kit A, 2x Kit B");
        assert_eq!(order.total_amount, 162_500);
        Ok(())
    }

    #[tokio::test]
    async fn quantities_too_large_to_merge_are_rejected_before_upload() {
        let h = harness(InMemoryProofStorage::new(), RecordingEmail::new());
        let mut req = request(true);
        req.items = vec![
            SubmittedItem {
                product_id: "kit-a".to_string(),
                quantity: 3_000_000_000,
            },
            SubmittedItem {
                product_id: "kit-a".to_string(),
                quantity: 3_000_000_000,
            },
        ];

        let result = h.service.ingest(req).await;

        assert!(matches!(result, Err(PortError::Validation(ref m)) if m.contains("too large")));
        assert!(h.storage.object_names().await.is_empty());
        assert!(h.orders.all().await.is_empty());
    }

    #[tokio::test]
    async fn total_that_overflows_is_rejected() {
        let orders = Arc::new(InMemoryOrders::new());
        let service = OrderIngestionService::new(
            orders.clone(),
            Arc::new(InMemoryCatalog::new(vec![Product {
                id: "gold".to_string(),
                name: "Gold Kit".to_string(),
                unit_price: Amount::MAX / 2,
                image: String::new(),
                category: None,
                description: String::new(),
            }])),
            Arc::new(InMemoryProofStorage::new()),
            Arc::new(RecordingEmail::new()),
            settings(),
            2_500,
        );
        let mut req = request(false);
        req.items = vec![SubmittedItem {
            product_id: "gold".to_string(),
            quantity: 3,
        }];

        let result = service.ingest(req).await;

        assert!(matches!(result, Err(PortError::Validation(_))));
        assert!(orders.all().await.is_empty());
    }

    #[tokio::test]
    async fn blank_shipping_fields_and_empty_items_are_validation_errors() {
        let h = harness(InMemoryProofStorage::new(), RecordingEmail::new());

        let mut blank = request(false);
        blank.shipping.address = String::new();
        assert!(matches!(
            h.service.ingest(blank).await,
            Err(PortError::Validation(_))
        ));

        let mut empty = request(false);
        empty.items.clear();
        assert!(matches!(
            h.service.ingest(empty).await,
            Err(PortError::Validation(_))
        ));

        let mut zero = request(false);
        zero.items[0].quantity = 0;
        assert!(matches!(
            h.service.ingest(zero).await,
            Err(PortError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn insert_failure_skips_the_notification() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_insert_order()
            .times(1)
            .returning(|_| Err(PortError::Unexpected("insert failed".to_string())));
        let mut storage = MockProofStorageService::new();
        storage
            .expect_upload()
            .times(1)
            .returning(|name, _, _| Ok(format!("https://cdn/{name}")));
        let mut email = MockEmailService::new();
        email.expect_send().never();

        let service = OrderIngestionService::new(
            Arc::new(orders),
            catalog(),
            Arc::new(storage),
            Arc::new(email),
            settings(),
            2_500,
        );

        let result = service.ingest(request(true)).await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }

    #[test]
    fn proof_names_keep_a_safe_extension() {
        let name = proof_object_name(Some("PNG"));
        assert!(name.ends_with(".png"));
        let (millis, rest) = name.split_once('_').unwrap_or_default();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), "abcdef12.png".len());

        assert!(proof_object_name(Some("php/../x")).ends_with(".bin"));
        assert!(proof_object_name(None).ends_with(".bin"));
    }
}
