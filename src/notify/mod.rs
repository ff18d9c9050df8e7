//! Notification dispatcher.
//!
//! Fire-and-forget emails about refund and invoice lifecycle events. The
//! contract is strict: a dispatch never blocks or fails the financial
//! operation that triggered it. Transport failures are caught, logged and
//! reported as a [`DispatchOutcome`]; nothing is retried here.

pub mod mailer;
pub mod messages;

use std::sync::Arc;

use tracing::{info, warn};

pub use mailer::{LogMailer, Mailer, OutboundEmail, SmtpMailer};

use crate::config::NotifyConfig;
use crate::models::{Invoice, Order, OrderRefundStatus, Refund};

/// What happened to one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn sent() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Sends lifecycle emails through the configured [`Mailer`].
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    config: NotifyConfig,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: NotifyConfig) -> Self {
        Self { mailer, config }
    }

    /// A refund request was created; tell the admin it awaits approval.
    pub async fn refund_requested(&self, order: &Order, refund: &Refund) -> DispatchOutcome {
        self.dispatch_admin(|to| messages::refund_requested_admin(to, order, refund))
            .await
    }

    /// A refund was approved; tell the customer.
    pub async fn refund_approved(&self, order: &Order, refund: &Refund) -> DispatchOutcome {
        self.dispatch(messages::refund_approved_customer(
            &order.customer_email,
            order,
            refund,
        ))
        .await
    }

    /// A refund was processed; tell the customer and the admin.
    pub async fn refund_processed(
        &self,
        order: &Order,
        refund: &Refund,
        aggregate: OrderRefundStatus,
    ) -> (DispatchOutcome, DispatchOutcome) {
        let customer = self
            .dispatch(messages::refund_processed_customer(
                &order.customer_email,
                order,
                refund,
                aggregate,
            ))
            .await;
        let admin = self
            .dispatch_admin(|to| messages::refund_processed_admin(to, order, refund, aggregate))
            .await;
        (customer, admin)
    }

    /// An invoice was issued; tell the customer.
    pub async fn invoice_issued(&self, invoice: &Invoice) -> DispatchOutcome {
        self.dispatch(messages::invoice_issued_customer(
            &invoice.customer_email,
            invoice,
        ))
        .await
    }

    async fn dispatch(&self, mail: OutboundEmail) -> DispatchOutcome {
        match self.mailer.send(&mail).await {
            Ok(()) => {
                info!("Notification sent to {}: {}", mail.to, mail.subject);
                DispatchOutcome::sent()
            }
            Err(e) => {
                warn!("Notification to {} failed: {}", mail.to, e);
                DispatchOutcome::failed(e)
            }
        }
    }

    async fn dispatch_admin(
        &self,
        build: impl FnOnce(&str) -> OutboundEmail,
    ) -> DispatchOutcome {
        match self.config.admin_address.as_deref() {
            Some(to) => self.dispatch(build(to)).await,
            None => {
                warn!("Admin notification skipped: admin email not configured");
                DispatchOutcome::failed("Admin email not configured")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::models::{OrderStatus, RefundMethod, RefundState};
    use crate::money::Currency;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &OutboundEmail) -> Result<(), String> {
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _mail: &OutboundEmail) -> Result<(), String> {
            Err("connection refused".to_string())
        }
    }

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            customer_name: "Marta Lindqvist".to_string(),
            customer_email: "marta@example.com".to_string(),
            shipping_address: "12 Alder Row, Malmo".to_string(),
            total_minor: 50_000,
            currency: Currency::new("EUR"),
            payment_method: "card".to_string(),
            status: OrderStatus::Delivered,
            refund_status: OrderRefundStatus::None,
            created_at: now,
            updated_at: now,
        }
    }

    fn refund() -> Refund {
        let now = Utc::now();
        Refund {
            id: 1,
            order_id: 1,
            invoice_id: None,
            amount_minor: 20_000,
            currency: Currency::new("EUR"),
            reason: "wrong color".to_string(),
            method: RefundMethod::Original,
            status: RefundState::Approved,
            txn_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn config(admin: Option<&str>) -> NotifyConfig {
        NotifyConfig {
            from_address: "billing@oakline.example".to_string(),
            admin_address: admin.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_customer_notification_goes_to_customer() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(mailer.clone(), config(Some("ops@oakline.example")));

        let outcome = notifier.refund_approved(&order(), &refund()).await;
        assert!(outcome.success);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "marta@example.com");
    }

    #[tokio::test]
    async fn test_missing_admin_email_degrades_without_sending() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(mailer.clone(), config(None));

        let outcome = notifier.refund_requested(&order(), &refund()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Admin email not configured"));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_not_thrown() {
        let notifier = Notifier::new(Arc::new(FailingMailer), config(Some("ops@oakline.example")));

        let (customer, admin) = notifier
            .refund_processed(&order(), &refund(), OrderRefundStatus::Partial)
            .await;
        assert!(!customer.success);
        assert_eq!(customer.error.as_deref(), Some("connection refused"));
        assert!(!admin.success);
    }
}
