//! Pure refund validation.
//!
//! Two tiers of checks guard a refund request. The structural tier
//! ([`validate_refund`]) needs only the order and the proposed amount; it
//! reports every violated rule, not just the first. The historical tier
//! ([`refundable_amount`], [`would_be_full_refund`]) needs the order's
//! existing refunds and is applied by the service layer, which is the only
//! place that has them loaded.

use thiserror::Error;

use crate::models::{Order, OrderRefundStatus, OrderStatus, Refund, RefundState};
use crate::money::{Currency, Money};

/// A violated refund rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefundRule {
    #[error("order is cancelled")]
    OrderCancelled,
    #[error("refund amount must not be negative")]
    AmountNegative,
    #[error("refund amount exceeds the order total")]
    ExceedsOrderTotal,
    #[error("refund amount must be greater than zero")]
    AmountZero,
    #[error("order is already fully refunded")]
    AlreadyFullyRefunded,
    #[error("refund amount exceeds the refundable balance of {refundable}")]
    ExceedsRefundable { refundable: Money },
    #[error("currency mismatch: order is {expected}, refund is {got}")]
    CurrencyMismatch { expected: Currency, got: Currency },
}

/// Check a proposed refund amount against the order itself.
///
/// Returns every violated rule in a fixed order; an empty vec means the
/// request is structurally valid. When the currencies differ the
/// amount-vs-total comparison is skipped (it would compare unlike units)
/// and the mismatch is reported instead.
pub fn validate_refund(order: &Order, amount: &Money) -> Vec<RefundRule> {
    let mut errors = Vec::new();
    let comparable = amount.same_currency(&order.total());

    if order.status == OrderStatus::Cancelled {
        errors.push(RefundRule::OrderCancelled);
    }
    if amount.is_negative() {
        errors.push(RefundRule::AmountNegative);
    }
    if comparable && amount.minor() > order.total_minor {
        errors.push(RefundRule::ExceedsOrderTotal);
    }
    if amount.is_zero() {
        errors.push(RefundRule::AmountZero);
    }
    if order.refund_status == OrderRefundStatus::Full {
        errors.push(RefundRule::AlreadyFullyRefunded);
    }
    if !comparable {
        errors.push(RefundRule::CurrencyMismatch {
            expected: order.currency.clone(),
            got: amount.currency().clone(),
        });
    }

    errors
}

/// Sum of refund amounts that already count against the order total.
///
/// Only `approved` and `processed` refunds are settled; `pending` requests
/// reserve nothing until approval.
pub fn settled_minor(refunds: &[Refund]) -> i64 {
    refunds
        .iter()
        .filter(|r| matches!(r.status, RefundState::Approved | RefundState::Processed))
        .map(|r| r.amount_minor)
        .sum()
}

/// How much of the order total is still refundable given the existing
/// refund history. Never negative.
pub fn refundable_amount(order_total: &Money, refunds: &[Refund]) -> Money {
    let remaining = (order_total.minor() - settled_minor(refunds)).max(0);
    Money::new(remaining, order_total.currency().clone())
}

/// Would this refund, once settled, exhaust the refundable balance?
pub fn would_be_full_refund(order_total: &Money, amount: &Money, refunds: &[Refund]) -> bool {
    amount.minor() >= refundable_amount(order_total, refunds).minor()
}

/// Map the settled refund sum to the order-level aggregate status.
pub fn derive_refund_status(total_minor: i64, settled_minor: i64) -> OrderRefundStatus {
    if settled_minor <= 0 {
        OrderRefundStatus::None
    } else if settled_minor >= total_minor {
        OrderRefundStatus::Full
    } else {
        OrderRefundStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::RefundMethod;

    fn eur(minor: i64) -> Money {
        Money::new(minor, Currency::new("EUR"))
    }

    fn order(total_minor: i64, status: OrderStatus, refund_status: OrderRefundStatus) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            customer_name: "Marta Lindqvist".to_string(),
            customer_email: "marta@example.com".to_string(),
            shipping_address: "12 Alder Row, Malmo".to_string(),
            total_minor,
            currency: Currency::new("EUR"),
            payment_method: "card".to_string(),
            status,
            refund_status,
            created_at: now,
            updated_at: now,
        }
    }

    fn refund(amount_minor: i64, status: RefundState) -> Refund {
        let now = Utc::now();
        Refund {
            id: 1,
            order_id: 1,
            invoice_id: None,
            amount_minor,
            currency: Currency::new("EUR"),
            reason: "damaged in transit".to_string(),
            method: RefundMethod::Original,
            status,
            txn_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_accepts_positive_amount_within_total() {
        let o = order(50_000, OrderStatus::Paid, OrderRefundStatus::None);
        assert!(validate_refund(&o, &eur(20_000)).is_empty());
        assert!(validate_refund(&o, &eur(50_000)).is_empty());
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        let o = order(10_000, OrderStatus::Paid, OrderRefundStatus::None);
        assert_eq!(validate_refund(&o, &eur(0)), vec![RefundRule::AmountZero]);
        assert_eq!(
            validate_refund(&o, &eur(-500)),
            vec![RefundRule::AmountNegative]
        );
    }

    #[test]
    fn test_rejects_amount_over_total() {
        let o = order(10_000, OrderStatus::Paid, OrderRefundStatus::None);
        assert_eq!(
            validate_refund(&o, &eur(10_001)),
            vec![RefundRule::ExceedsOrderTotal]
        );
    }

    #[test]
    fn test_rejects_cancelled_order() {
        let o = order(10_000, OrderStatus::Cancelled, OrderRefundStatus::None);
        assert_eq!(
            validate_refund(&o, &eur(1_000)),
            vec![RefundRule::OrderCancelled]
        );
    }

    #[test]
    fn test_rejects_fully_refunded_order() {
        let o = order(10_000, OrderStatus::Delivered, OrderRefundStatus::Full);
        assert_eq!(
            validate_refund(&o, &eur(1_000)),
            vec![RefundRule::AlreadyFullyRefunded]
        );
    }

    #[test]
    fn test_reports_all_violations_in_order() {
        let o = order(10_000, OrderStatus::Cancelled, OrderRefundStatus::Full);
        assert_eq!(
            validate_refund(&o, &eur(-1)),
            vec![
                RefundRule::OrderCancelled,
                RefundRule::AmountNegative,
                RefundRule::AlreadyFullyRefunded,
            ]
        );
    }

    #[test]
    fn test_currency_mismatch_skips_total_comparison() {
        let o = order(10_000, OrderStatus::Paid, OrderRefundStatus::None);
        let usd = Money::new(999_999, Currency::new("USD"));
        assert_eq!(
            validate_refund(&o, &usd),
            vec![RefundRule::CurrencyMismatch {
                expected: Currency::new("EUR"),
                got: Currency::new("USD"),
            }]
        );
    }

    #[test]
    fn test_refundable_ignores_pending() {
        let refunds = vec![
            refund(300, RefundState::Processed),
            refund(200, RefundState::Pending),
        ];
        assert_eq!(refundable_amount(&eur(1_000), &refunds), eur(700));
    }

    #[test]
    fn test_refundable_counts_approved_and_processed() {
        let refunds = vec![
            refund(300, RefundState::Processed),
            refund(400, RefundState::Approved),
        ];
        assert_eq!(refundable_amount(&eur(1_000), &refunds), eur(300));
    }

    #[test]
    fn test_refundable_never_negative() {
        let refunds = vec![refund(1_500, RefundState::Processed)];
        assert_eq!(refundable_amount(&eur(1_000), &refunds), eur(0));
    }

    #[test]
    fn test_would_be_full_refund() {
        let refunds = vec![refund(300, RefundState::Processed)];
        assert!(would_be_full_refund(&eur(1_000), &eur(700), &refunds));
        assert!(would_be_full_refund(&eur(1_000), &eur(900), &refunds));
        assert!(!would_be_full_refund(&eur(1_000), &eur(600), &refunds));
    }

    #[test]
    fn test_derive_refund_status_boundaries() {
        assert_eq!(derive_refund_status(1_000, 0), OrderRefundStatus::None);
        assert_eq!(derive_refund_status(1_000, 1), OrderRefundStatus::Partial);
        assert_eq!(derive_refund_status(1_000, 999), OrderRefundStatus::Partial);
        assert_eq!(derive_refund_status(1_000, 1_000), OrderRefundStatus::Full);
        assert_eq!(derive_refund_status(1_000, 1_200), OrderRefundStatus::Full);
    }
}
