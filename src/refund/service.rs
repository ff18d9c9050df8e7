//! Refund lifecycle service.
//!
//! Each mutating operation runs one database transaction covering the read,
//! the validation and every write, so a competing request against the same
//! order sees either none or all of it. Notifications go out only after the
//! commit and never affect the result.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{BillingError, Result};
use crate::models::{Order, Refund, RefundMethod, RefundState};
use crate::money::Money;
use crate::notify::Notifier;
use crate::refund::validate::{
    derive_refund_status, refundable_amount, validate_refund, RefundRule,
};

/// Drives refunds through `pending -> approved -> processed`.
#[derive(Clone)]
pub struct RefundService {
    pool: SqlitePool,
    notifier: Notifier,
}

impl RefundService {
    pub fn new(pool: SqlitePool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// Create a refund request in `pending` state.
    ///
    /// Runs the structural validator first, then the historical check: the
    /// amount must fit inside the balance left by the order's already
    /// settled (approved or processed) refunds. Every violated rule is
    /// reported together in one `Validation` error.
    pub async fn request_refund(
        &self,
        order_id: i64,
        amount_minor: i64,
        reason: &str,
        method: RefundMethod,
    ) -> Result<Refund> {
        let mut tx = self.pool.begin().await?;

        let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?1")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BillingError::not_found("order", order_id))?;

        let settled: Vec<Refund> = sqlx::query_as(
            "SELECT * FROM refunds WHERE order_id = ?1 AND status IN ('approved', 'processed')",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let amount = Money::new(amount_minor, order.currency.clone());
        let mut errors = validate_refund(&order, &amount);

        let refundable = refundable_amount(&order.total(), &settled);
        if amount.is_positive()
            && amount.same_currency(&refundable)
            && amount.minor() <= order.total_minor
            && amount.minor() > refundable.minor()
        {
            errors.push(RefundRule::ExceedsRefundable { refundable });
        }

        if !errors.is_empty() {
            return Err(BillingError::Validation(errors));
        }

        let now = Utc::now();
        let refund: Refund = sqlx::query_as(
            r#"
            INSERT INTO refunds (order_id, amount_minor, currency, reason, method, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?6)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(amount_minor)
        .bind(&order.currency)
        .bind(reason)
        .bind(method)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Refund {} requested for order {} ({})",
            refund.id,
            order_id,
            refund.amount()
        );

        self.notifier.refund_requested(&order, &refund).await;
        Ok(refund)
    }

    /// Move a `pending` refund to `approved` and refresh the order's
    /// aggregate refund status in the same transaction.
    ///
    /// Pending requests reserve nothing, so approval is the gate that keeps
    /// the settled sum within the order total: approving a refund that no
    /// longer fits the remaining balance is rejected.
    pub async fn approve(&self, refund_id: i64) -> Result<Refund> {
        let mut tx = self.pool.begin().await?;

        let refund: Refund = sqlx::query_as("SELECT * FROM refunds WHERE id = ?1")
            .bind(refund_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BillingError::not_found("refund", refund_id))?;

        if refund.status != RefundState::Pending {
            return Err(BillingError::InvalidState {
                id: refund_id,
                target: RefundState::Approved,
                actual: refund.status,
            });
        }

        let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?1")
            .bind(refund.order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BillingError::not_found("order", refund.order_id))?;

        let others: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_minor), 0) FROM refunds
            WHERE order_id = ?1 AND id <> ?2 AND status IN ('approved', 'processed')
            "#,
        )
        .bind(refund.order_id)
        .bind(refund_id)
        .fetch_one(&mut *tx)
        .await?;

        if others + refund.amount_minor > order.total_minor {
            let refundable = Money::new(
                (order.total_minor - others).max(0),
                order.currency.clone(),
            );
            return Err(BillingError::Validation(vec![
                RefundRule::ExceedsRefundable { refundable },
            ]));
        }

        let now = Utc::now();
        let updated: Refund = sqlx::query_as(
            "UPDATE refunds SET status = 'approved', updated_at = ?1 WHERE id = ?2 RETURNING *",
        )
        .bind(now)
        .bind(refund_id)
        .fetch_one(&mut *tx)
        .await?;

        let aggregate = derive_refund_status(order.total_minor, others + refund.amount_minor);
        sqlx::query("UPDATE orders SET refund_status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(aggregate)
            .bind(now)
            .bind(order.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "Refund {} approved for order {}; order refund status now {}",
            refund_id,
            order.id,
            aggregate.as_str()
        );

        self.notifier.refund_approved(&order, &updated).await;
        Ok(updated)
    }

    /// Move an `approved` refund to `processed`.
    ///
    /// This is where a real payment processor would be charged back; here
    /// the transfer is simulated with a generated processor reference. The
    /// order aggregate is recomputed and persisted in the same transaction.
    pub async fn process(&self, refund_id: i64) -> Result<Refund> {
        let mut tx = self.pool.begin().await?;

        let refund: Refund = sqlx::query_as("SELECT * FROM refunds WHERE id = ?1")
            .bind(refund_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BillingError::not_found("refund", refund_id))?;

        if refund.status != RefundState::Approved {
            return Err(BillingError::InvalidState {
                id: refund_id,
                target: RefundState::Processed,
                actual: refund.status,
            });
        }

        let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?1")
            .bind(refund.order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BillingError::not_found("order", refund.order_id))?;

        let txn_reference = format!("ref_{}", Uuid::new_v4().simple());
        let now = Utc::now();
        let updated: Refund = sqlx::query_as(
            r#"
            UPDATE refunds SET status = 'processed', txn_reference = ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING *
            "#,
        )
        .bind(&txn_reference)
        .bind(now)
        .bind(refund_id)
        .fetch_one(&mut *tx)
        .await?;

        let settled: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_minor), 0) FROM refunds
            WHERE order_id = ?1 AND status IN ('approved', 'processed')
            "#,
        )
        .bind(refund.order_id)
        .fetch_one(&mut *tx)
        .await?;

        let aggregate = derive_refund_status(order.total_minor, settled);
        sqlx::query("UPDATE orders SET refund_status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(aggregate)
            .bind(now)
            .bind(order.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "Refund {} processed for order {} as {}; order refund status now {}",
            refund_id,
            order.id,
            txn_reference,
            aggregate.as_str()
        );

        self.notifier
            .refund_processed(&order, &updated, aggregate)
            .await;
        Ok(updated)
    }

    /// Fetch a single refund.
    pub async fn get(&self, refund_id: i64) -> Result<Refund> {
        sqlx::query_as("SELECT * FROM refunds WHERE id = ?1")
            .bind(refund_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BillingError::not_found("refund", refund_id))
    }

    /// All refunds, newest first.
    pub async fn list(&self) -> Result<Vec<Refund>> {
        let refunds = sqlx::query_as("SELECT * FROM refunds ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(refunds)
    }

    /// Refunds for one order, newest first.
    pub async fn list_for_order(&self, order_id: i64) -> Result<Vec<Refund>> {
        let refunds = sqlx::query_as(
            "SELECT * FROM refunds WHERE order_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(refunds)
    }
}
