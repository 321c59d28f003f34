//! crates/storefront_core/src/notifications.rs
//!
//! Builds the two emails the storefront sends: the operator's new-order notice
//! and the customer's payment confirmation.

use chrono::{Datelike, Utc};

use crate::domain::{Amount, EmailMessage, Order};

/// Addresses and links used when composing emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    /// Sender for operator notices.
    pub orders_from: String,
    /// Sender for customer confirmations.
    pub confirmation_from: String,
    /// Where new-order notices go.
    pub operator_email: String,
    /// Public base URL of the storefront, used to link the admin dashboard.
    pub site_url: String,
    pub store_name: String,
}

/// Formats an amount as Naira with thousands separators, e.g. `₦112,500`.
pub fn format_naira(amount: Amount) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}₦{grouped}")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// The notice sent to the store operator when an order comes in.
pub fn new_order_notice(settings: &NotificationSettings, order: &Order) -> EmailMessage {
    let total = format_naira(order.total_amount);
    let proof = match &order.payment_proof_url {
        Some(url) => format!(
            r#"<a href="{}" style="display: inline-block; padding: 10px 20px; background: #db2777; color: #fff; text-decoration: none; border-radius: 8px;">View Screenshot</a>"#,
            escape_html(url)
        ),
        None => r#"<span style="color: red;">No screenshot uploaded!</span>"#.to_string(),
    };

    let html = format!(
        r#"<div style="font-family: sans-serif; line-height: 1.6; color: #111; max-width: 600px;">
<h2 style="color: #db2777;">New Order Received!</h2>
<p>A new manual transfer order requires verification.</p>
<div style="background: #f9fafb; padding: 20px; border-radius: 12px; margin: 20px 0;">
<p><strong>Order:</strong> {id}</p>
<p><strong>Customer:</strong> {name}</p>
<p><strong>Total:</strong> {total}</p>
<p><strong>Items:</strong> {items}</p>
</div>
<p><strong>Proof of Payment:</strong><br />{proof}</p>
<p style="font-size: 12px; color: #666;">View this order in your <a href="{site}/admin/orders">Admin Dashboard</a> to verify.</p>
</div>"#,
        id = order.id,
        name = escape_html(&order.customer_name),
        items = escape_html(&order.items_summary),
        site = settings.site_url.trim_end_matches('/'),
    );

    EmailMessage {
        from: settings.orders_from.clone(),
        to: settings.operator_email.clone(),
        subject: format!("New Order: {total} - {}", order.customer_name),
        html,
    }
}

/// The confirmation sent to a customer once their transfer has been verified.
pub fn payment_confirmation(settings: &NotificationSettings, order: &Order) -> EmailMessage {
    let total = format_naira(order.total_amount);
    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; color: #333;">
<h1 style="color: #ec4899;">Payment Verified!</h1>
<p>Hi <strong>{name}</strong>,</p>
<p>Your payment of <strong>{total}</strong> has been verified by our team. We are now preparing your order for delivery.</p>
<div style="background-color: #fdf2f8; padding: 16px; border-radius: 8px; margin: 24px 0;">
<h3 style="color: #be185d; margin-top: 0;">Order Details</h3>
<p><strong>Items:</strong> {items}</p>
<p><strong>Total Paid:</strong> {total}</p>
<p><strong>Status:</strong> Processing for Delivery</p>
</div>
<p style="font-size: 14px; color: #666;">You will receive another update once your order is out for delivery. Reply to this email with any questions.</p>
<p style="font-size: 12px; color: #999; text-align: center;">&copy; {year} {store}. All rights reserved.</p>
</div>"#,
        name = escape_html(&order.customer_name),
        items = escape_html(&order.items_summary),
        year = Utc::now().year(),
        store = escape_html(&settings.store_name),
    );

    EmailMessage {
        from: settings.confirmation_from.clone(),
        to: order.email.clone(),
        subject: format!(
            "Payment Confirmed! Your {} Order is Processing",
            settings.store_name
        ),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderStatus, MANUAL_TRANSFER};
    use uuid::Uuid;

    fn settings() -> NotificationSettings {
        NotificationSettings {
            orders_from: "Orders <orders@example.com>".to_string(),
            confirmation_from: "Store <hello@example.com>".to_string(),
            operator_email: "owner@example.com".to_string(),
            site_url: "https://shop.example.com/".to_string(),
            store_name: "Shapes Online".to_string(),
        }
    }

    fn order(proof: Option<&str>) -> Order {
        Order {
            id: Uuid::new_v4(),
            customer_name: "Jane <Doe>".to_string(),
            email: "jane@example.com".to_string(),
            phone: "080".to_string(),
            address: "Lagos".to_string(),
            items_summary: "1x Kit A, 2x Kit B".to_string(),
            total_amount: 112_500,
            payment_method: MANUAL_TRANSFER.to_string(),
            payment_proof_url: proof.map(str::to_string),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn naira_is_grouped_by_thousands() {
        assert_eq!(format_naira(0), "₦0");
        assert_eq!(format_naira(999), "₦999");
        assert_eq!(format_naira(2_500), "₦2,500");
        assert_eq!(format_naira(112_500), "₦112,500");
        assert_eq!(format_naira(1_000_000), "₦1,000,000");
    }

    #[test]
    fn operator_notice_links_the_proof_and_dashboard() {
        let message = new_order_notice(&settings(), &order(Some("https://cdn/p.png")));
        assert_eq!(message.to, "owner@example.com");
        assert!(message.subject.contains("₦112,500"));
        assert!(message.html.contains("https://cdn/p.png"));
        assert!(message.html.contains("https://shop.example.com/admin/orders"));
        assert!(message.html.contains("Jane &lt;Doe&gt;"));
    }

    #[test]
    fn operator_notice_flags_missing_proof() {
        let message = new_order_notice(&settings(), &order(None));
        assert!(message.html.contains("No screenshot uploaded!"));
    }

    #[test]
    fn confirmation_goes_to_the_customer_with_formatted_total() {
        let message = payment_confirmation(&settings(), &order(None));
        assert_eq!(message.to, "jane@example.com");
        assert_eq!(message.from, "Store <hello@example.com>");
        assert!(message.html.contains("₦112,500"));
        assert!(message.html.contains("1x Kit A, 2x Kit B"));
    }
}
