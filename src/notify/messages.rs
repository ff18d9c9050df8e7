//! Email content for refund and invoice lifecycle events.
//!
//! Plain formatted strings with a minimal HTML alternative; there is no
//! template engine here and none is wanted.

use crate::invoice::store::PdfStore;
use crate::models::{Invoice, Order, OrderRefundStatus, Refund};

pub fn refund_requested_admin(to: &str, order: &Order, refund: &Refund) -> super::OutboundEmail {
    let subject = format!(
        "Refund request #{} for order #{} awaiting approval",
        refund.id, order.id
    );
    let lines = [
        format!(
            "A refund of {} was requested for order #{} ({}).",
            refund.amount(),
            order.id,
            order.customer_email
        ),
        format!("Reason: {}", refund.reason),
        format!("Refund method: {}.", refund.method.label()),
        "The request is pending approval in the admin dashboard.".to_string(),
    ];
    email(to, subject, &lines)
}

pub fn refund_approved_customer(to: &str, order: &Order, refund: &Refund) -> super::OutboundEmail {
    let subject = format!("Your refund for order #{} has been approved", order.id);
    let lines = [
        format!("Hi {},", order.customer_name),
        format!(
            "Your refund of {} for order #{} has been approved and will be \
             processed shortly via your {}.",
            refund.amount(),
            order.id,
            refund.method.label()
        ),
    ];
    email(to, subject, &lines)
}

pub fn refund_processed_customer(
    to: &str,
    order: &Order,
    refund: &Refund,
    aggregate: OrderRefundStatus,
) -> super::OutboundEmail {
    let refund_type = if aggregate == OrderRefundStatus::Full {
        "full"
    } else {
        "partial"
    };
    let subject = format!(
        "Your {} refund of {} for order #{} has been processed",
        refund_type,
        refund.amount(),
        order.id
    );
    let reference = refund.txn_reference.as_deref().unwrap_or("n/a");
    let lines = [
        format!("Hi {},", order.customer_name),
        format!(
            "We have processed a {} refund of {} to your {}. \
             Depending on your bank it can take a few business days to appear.",
            refund_type,
            refund.amount(),
            refund.method.label()
        ),
        format!("Reference number: {reference}"),
    ];
    email(to, subject, &lines)
}

pub fn refund_processed_admin(
    to: &str,
    order: &Order,
    refund: &Refund,
    aggregate: OrderRefundStatus,
) -> super::OutboundEmail {
    let subject = format!("Refund #{} processed for order #{}", refund.id, order.id);
    let lines = [
        format!(
            "Refund #{} of {} for order #{} has been processed.",
            refund.id,
            refund.amount(),
            order.id
        ),
        format!("Order refund status is now: {}.", aggregate.as_str()),
    ];
    email(to, subject, &lines)
}

pub fn invoice_issued_customer(to: &str, invoice: &Invoice) -> super::OutboundEmail {
    let subject = format!("Invoice {} from Oakline Furniture", invoice.invoice_number);
    let lines = [
        format!("Hi {},", invoice.customer_name),
        format!(
            "Invoice {} for your order has been issued. Total: {} \
             (incl. VAT {}).",
            invoice.invoice_number,
            invoice.total(),
            invoice.tax()
        ),
        format!(
            "You can download it at {}.",
            PdfStore::public_url(&invoice.invoice_number)
        ),
    ];
    email(to, subject, &lines)
}

fn email(to: &str, subject: String, lines: &[String]) -> super::OutboundEmail {
    super::OutboundEmail {
        to: to.to_string(),
        html: html_wrap(&subject, lines),
        text: lines.join("\n\n"),
        subject,
    }
}

fn html_wrap(title: &str, lines: &[String]) -> String {
    let body: String = lines
        .iter()
        .map(|l| format!("    <p>{l}</p>\n"))
        .collect();
    format!(
        "<html>\n  <body>\n    <h2>{title}</h2>\n{body}  </body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{OrderStatus, RefundMethod, RefundState};
    use crate::money::Currency;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: 9,
            customer_name: "Marta Lindqvist".to_string(),
            customer_email: "marta@example.com".to_string(),
            shipping_address: "12 Alder Row, Malmo".to_string(),
            total_minor: 50_000,
            currency: Currency::new("EUR"),
            payment_method: "card".to_string(),
            status: OrderStatus::Delivered,
            refund_status: OrderRefundStatus::Partial,
            created_at: now,
            updated_at: now,
        }
    }

    fn refund() -> Refund {
        let now = Utc::now();
        Refund {
            id: 3,
            order_id: 9,
            invoice_id: None,
            amount_minor: 20_000,
            currency: Currency::new("EUR"),
            reason: "damaged in transit".to_string(),
            method: RefundMethod::Original,
            status: RefundState::Processed,
            txn_reference: Some("ref_abc123".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_processed_customer_mentions_partial_and_reference() {
        let mail =
            refund_processed_customer("marta@example.com", &order(), &refund(), OrderRefundStatus::Partial);
        assert!(mail.subject.contains("partial refund of 200.00 EUR"));
        assert!(mail.text.contains("ref_abc123"));
        assert!(mail.html.contains("<p>"));
    }

    #[test]
    fn test_processed_customer_full_wording() {
        let mail =
            refund_processed_customer("marta@example.com", &order(), &refund(), OrderRefundStatus::Full);
        assert!(mail.subject.contains("full refund"));
    }

    #[test]
    fn test_requested_admin_includes_reason() {
        let mail = refund_requested_admin("ops@oakline.example", &order(), &refund());
        assert_eq!(mail.to, "ops@oakline.example");
        assert!(mail.text.contains("damaged in transit"));
    }
}
