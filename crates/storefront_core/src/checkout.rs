//! crates/storefront_core/src/checkout.rs
//!
//! Turns the shopper's cart and shipping form into a single submission and hands
//! it to the order ingestion endpoint.
//!
//! Everything that can be checked locally is checked before the gateway is
//! touched, so a rejected form never costs a network round trip.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cart::CartStore;
use crate::domain::{checked_sum, summarize_items, Amount, CartEntry};
use crate::ports::{CartStorage, OrderGateway};

/// Errors a shopper can see while checking out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    /// The form or cart is incomplete; nothing was sent.
    #[error("{0}")]
    Validation(String),
    /// The server (or the network) refused the order. The cart is left intact.
    #[error("{0}")]
    Rejected(String),
}

//=========================================================================================
// Submission Schema
//=========================================================================================

/// Multipart field names shared by the checkout client and the ingestion endpoint.
pub mod fields {
    pub const FULL_NAME: &str = "full_name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const ADDRESS: &str = "address";
    /// JSON array of `{productId, quantity}`.
    pub const ITEMS: &str = "items";
    pub const ITEMS_SUMMARY: &str = "items_summary";
    pub const TOTAL: &str = "total";
    pub const SCREENSHOT: &str = "screenshot";
}

/// The shipping form as filled in by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ShippingDetails {
    /// Checks that every required field is filled in, naming the first one that is not.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("full name", &self.full_name),
            ("email", &self.email),
            ("phone number", &self.phone),
            ("delivery address", &self.address),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((label, _)) => Err(format!("Please enter your {label}.")),
            None => Ok(()),
        }
    }

    /// The same details with surrounding whitespace removed.
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

/// The screenshot proving the bank transfer was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PaymentProof {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The file extension, if the original name had one.
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// A line as sent to the server: which product, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedItem {
    pub product_id: String,
    pub quantity: u32,
}

/// Everything the ingestion endpoint needs for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSubmission {
    pub shipping: ShippingDetails,
    pub items: Vec<SubmittedItem>,
    pub items_summary: String,
    pub total: Amount,
    pub proof: PaymentProof,
}

impl CheckoutSubmission {
    /// Validates the form and builds the submission for `entries`.
    pub fn prepare(
        entries: &[CartEntry],
        shipping: &ShippingDetails,
        proof: Option<PaymentProof>,
        delivery_fee: Amount,
    ) -> Result<Self, CheckoutError> {
        if entries.is_empty() {
            return Err(CheckoutError::Validation(
                "Your cart is empty.".to_string(),
            ));
        }
        shipping.validate().map_err(CheckoutError::Validation)?;

        let proof = proof.filter(|p| !p.is_empty()).ok_or_else(|| {
            CheckoutError::Validation(
                "Please upload your payment screenshot before placing the order.".to_string(),
            )
        })?;

        let items_summary = summarize_items(
            entries
                .iter()
                .map(|entry| (entry.quantity, entry.name.as_str())),
        );
        let total = checked_sum(entries.iter().map(CartEntry::line_total))
            .and_then(|subtotal| subtotal.checked_add(delivery_fee))
            .ok_or_else(|| {
                CheckoutError::Validation("Your order total is too large.".to_string())
            })?;
        let items = entries
            .iter()
            .map(|entry| SubmittedItem {
                product_id: entry.product_id.clone(),
                quantity: entry.quantity,
            })
            .collect();

        Ok(Self {
            shipping: shipping.trimmed(),
            items,
            items_summary,
            total,
            proof,
        })
    }
}

//=========================================================================================
// Placing the Order
//=========================================================================================

/// Submits the cart as an order.
///
/// On success the cart is cleared (which notifies its observers) and the new
/// order id is returned for the confirmation view. On failure the cart is kept
/// so the shopper can retry without re-entering anything.
pub async fn place_order<S: CartStorage>(
    cart: &mut CartStore<S>,
    gateway: &dyn OrderGateway,
    shipping: &ShippingDetails,
    proof: Option<PaymentProof>,
    delivery_fee: Amount,
) -> Result<Uuid, CheckoutError> {
    let submission = CheckoutSubmission::prepare(cart.entries(), shipping, proof, delivery_fee)?;

    match gateway.submit(&submission).await {
        Ok(order_id) => {
            info!("Order {} placed, clearing cart", order_id);
            cart.clear();
            Ok(order_id)
        }
        Err(message) => {
            warn!("Order submission rejected: {}", message);
            Err(CheckoutError::Rejected(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::MemoryCartStorage;
    use crate::domain::Product;
    use crate::ports::MockOrderGateway;
    use testresult::TestResult;

    fn kit(id: &str, name: &str, unit_price: Amount) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            unit_price,
            image: String::new(),
            category: None,
            description: String::new(),
        }
    }

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "08012345678".to_string(),
            address: "12 Marina Road, Lagos".to_string(),
        }
    }

    fn proof() -> PaymentProof {
        PaymentProof {
            file_name: "receipt.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    fn two_kit_cart() -> CartStore<MemoryCartStorage> {
        let mut cart = CartStore::open(MemoryCartStorage::new());
        let a = kit("a", "Kit A", 50_000);
        let b = kit("b", "Kit B", 30_000);
        cart.add_item(&a);
        cart.add_item(&b);
        cart.add_item(&b);
        cart
    }

    #[test]
    fn prepare_computes_total_and_summary() -> TestResult {
        let cart = two_kit_cart();
        let submission =
            CheckoutSubmission::prepare(cart.entries(), &shipping(), Some(proof()), 2_500)?;

        assert_eq!(submission.total, 112_500);
        assert_eq!(submission.items_summary, "1x Kit A, 2x Kit B");
        assert_eq!(submission.items.len(), 2);
        Ok(())
    }

    #[test]
    fn total_that_overflows_with_delivery_is_a_validation_error() {
        let entries = [CartEntry::from_product(&kit("a", "Kit A", Amount::MAX))];

        let result = CheckoutSubmission::prepare(&entries, &shipping(), Some(proof()), 2_500);

        assert_eq!(
            result,
            Err(CheckoutError::Validation(
                "Your order total is too large.".to_string()
            ))
        );
    }

    #[test]
    fn blank_fields_are_rejected_by_name() {
        let cart = two_kit_cart();
        let mut form = shipping();
        form.phone = "   ".to_string();

        let result = CheckoutSubmission::prepare(cart.entries(), &form, Some(proof()), 2_500);
        assert_eq!(
            result,
            Err(CheckoutError::Validation(
                "Please enter your phone number.".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn missing_proof_is_rejected_before_any_network_call() {
        let mut cart = two_kit_cart();
        let mut gateway = MockOrderGateway::new();
        gateway.expect_submit().never();

        let result = place_order(&mut cart, &gateway, &shipping(), None, 2_500).await;

        assert!(matches!(result, Err(CheckoutError::Validation(_))));
        assert_eq!(cart.entries().len(), 2);
    }

    #[tokio::test]
    async fn empty_proof_counts_as_missing() {
        let mut cart = two_kit_cart();
        let mut gateway = MockOrderGateway::new();
        gateway.expect_submit().never();

        let empty = PaymentProof {
            bytes: Vec::new(),
            ..proof()
        };
        let result = place_order(&mut cart, &gateway, &shipping(), Some(empty), 2_500).await;
        assert!(matches!(result, Err(CheckoutError::Validation(_))));
    }

    #[tokio::test]
    async fn success_clears_the_cart_and_notifies_observers() -> TestResult {
        let mut cart = two_kit_cart();
        let mut count = cart.subscribe();
        let order_id = Uuid::new_v4();

        let mut gateway = MockOrderGateway::new();
        gateway
            .expect_submit()
            .withf(|s| s.total == 112_500 && s.shipping.full_name == "Jane Doe")
            .times(1)
            .returning(move |_| Ok(order_id));

        let placed = place_order(&mut cart, &gateway, &shipping(), Some(proof()), 2_500).await?;

        assert_eq!(placed, order_id);
        assert!(cart.is_empty());
        assert_eq!(*count.borrow_and_update(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn rejection_keeps_the_cart_and_surfaces_the_message() {
        let mut cart = two_kit_cart();
        let mut gateway = MockOrderGateway::new();
        gateway
            .expect_submit()
            .times(1)
            .returning(|_| Err("Storage unavailable".to_string()));

        let result = place_order(&mut cart, &gateway, &shipping(), Some(proof()), 2_500).await;

        assert_eq!(
            result,
            Err(CheckoutError::Rejected("Storage unavailable".to_string()))
        );
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn proof_extension_comes_from_the_file_name() {
        assert_eq!(proof().extension(), Some("png"));
        let bare = PaymentProof {
            file_name: "receipt".to_string(),
            ..proof()
        };
        assert_eq!(bare.extension(), None);
    }
}
