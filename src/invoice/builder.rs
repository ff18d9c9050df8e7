//! Invoice assembly and persistence.
//!
//! An invoice is a frozen snapshot of an order at the moment of invoicing:
//! the line items are copied by value, so later catalog edits never rewrite
//! a historical invoice. Totals are computed here, in integer minor units,
//! and the renderer only ever prints them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{BillingError, Result};
use crate::invoice::number::next_invoice_number;
use crate::invoice::pdf::render_invoice;
use crate::invoice::store::PdfStore;
use crate::models::{
    Invoice, InvoiceDetail, InvoiceItem, InvoiceStatus, Order, OrderItem, OrderStatus,
};
use crate::notify::Notifier;

/// Flat VAT rate applied to every invoice, in basis points.
pub const VAT_RATE_BP: i64 = 2_000;

/// Shipping charged on invoices.
// TODO: read shipping from the order once carrier pricing is stored there.
pub const SHIPPING_MINOR: i64 = 0;

/// VAT on a subtotal, rounded half-up in minor units.
pub fn vat_amount(subtotal_minor: i64) -> i64 {
    (subtotal_minor * VAT_RATE_BP + 5_000) / 10_000
}

/// Invoice status derived from the order's lifecycle status.
pub fn invoice_status_for(order_status: OrderStatus) -> InvoiceStatus {
    match order_status {
        OrderStatus::Paid => InvoiceStatus::Paid,
        OrderStatus::PendingPayment | OrderStatus::PendingCod => InvoiceStatus::Pending,
        _ => InvoiceStatus::Draft,
    }
}

/// Map an order's payment-method token to the label printed on invoices.
pub fn payment_method_label(token: &str) -> String {
    match token {
        "card" | "credit_card" => "Credit / debit card".to_string(),
        "cod" | "cash_on_delivery" => "Cash on delivery".to_string(),
        "transfer" | "bank_transfer" => "Bank transfer".to_string(),
        other => other.to_string(),
    }
}

/// Builds, stores and renders invoices.
#[derive(Clone)]
pub struct InvoiceService {
    pool: SqlitePool,
    pdfs: PdfStore,
    notifier: Notifier,
}

impl InvoiceService {
    pub fn new(pool: SqlitePool, pdfs: PdfStore, notifier: Notifier) -> Self {
        Self {
            pool,
            pdfs,
            notifier,
        }
    }

    pub fn pdf_store(&self) -> &PdfStore {
        &self.pdfs
    }

    /// Create an invoice for an order.
    ///
    /// Reads the order's items as they are right now, freezes them into
    /// invoice items, allocates the invoice number and writes everything in
    /// one transaction. The customer notification goes out after commit.
    pub async fn create_invoice(&self, order_id: i64) -> Result<InvoiceDetail> {
        let mut tx = self.pool.begin().await?;

        let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?1")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BillingError::not_found("order", order_id))?;

        let order_items: Vec<OrderItem> =
            sqlx::query_as("SELECT * FROM order_items WHERE order_id = ?1 ORDER BY id")
                .bind(order_id)
                .fetch_all(&mut *tx)
                .await?;

        let invoice_number = next_invoice_number(&mut tx).await?;

        let subtotal_minor: i64 = order_items.iter().map(|i| i.line_total_minor).sum();
        let tax_minor = vat_amount(subtotal_minor);
        let total_minor = subtotal_minor + tax_minor + SHIPPING_MINOR;

        let now = Utc::now();
        let invoice: Invoice = sqlx::query_as(
            r#"
            INSERT INTO invoices (
                invoice_number, order_id, customer_name, customer_email, billing_address,
                subtotal_minor, tax_minor, shipping_minor, total_minor, currency,
                payment_method, status, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            RETURNING *
            "#,
        )
        .bind(&invoice_number)
        .bind(order.id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.shipping_address)
        .bind(subtotal_minor)
        .bind(tax_minor)
        .bind(SHIPPING_MINOR)
        .bind(total_minor)
        .bind(&order.currency)
        .bind(payment_method_label(&order.payment_method))
        .bind(invoice_status_for(order.status))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(order_items.len());
        for item in &order_items {
            let frozen: InvoiceItem = sqlx::query_as(
                r#"
                INSERT INTO invoice_items (invoice_id, name, quantity, unit_price_minor, line_total_minor)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING *
                "#,
            )
            .bind(invoice.id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price_minor)
            .bind(item.line_total_minor)
            .fetch_one(&mut *tx)
            .await?;
            items.push(frozen);
        }

        tx.commit().await?;

        info!(
            "Invoice {} created for order {} ({})",
            invoice.invoice_number,
            order.id,
            invoice.total()
        );

        self.notifier.invoice_issued(&invoice).await;
        Ok(InvoiceDetail { invoice, items })
    }

    /// Render an invoice to PDF, persist it and record the stored path.
    ///
    /// The invoice itself is already committed; a rendering or storage
    /// failure here leaves it intact with `pdf_path` unset, and calling
    /// again retries.
    pub async fn render_pdf(&self, invoice_id: i64) -> Result<Invoice> {
        let detail = self.get(invoice_id).await?;

        let bytes = render_invoice(&detail.invoice, &detail.items)?;
        let path = self
            .pdfs
            .save(&detail.invoice.invoice_number, &bytes)
            .await?;

        let stored_path = path.to_string_lossy().into_owned();
        let updated: Invoice =
            sqlx::query_as("UPDATE invoices SET pdf_path = ?1 WHERE id = ?2 RETURNING *")
                .bind(&stored_path)
                .bind(invoice_id)
                .fetch_one(&self.pool)
                .await?;

        info!(
            "Invoice {} rendered to {} ({} bytes)",
            updated.invoice_number,
            path.display(),
            bytes.len()
        );
        Ok(updated)
    }

    /// Fetch an invoice with its frozen items.
    pub async fn get(&self, invoice_id: i64) -> Result<InvoiceDetail> {
        let invoice: Invoice = sqlx::query_as("SELECT * FROM invoices WHERE id = ?1")
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BillingError::not_found("invoice", invoice_id))?;

        let items: Vec<InvoiceItem> =
            sqlx::query_as("SELECT * FROM invoice_items WHERE invoice_id = ?1 ORDER BY id")
                .bind(invoice_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(InvoiceDetail { invoice, items })
    }

    /// Fetch an invoice by its external number.
    pub async fn get_by_number(&self, invoice_number: &str) -> Result<Invoice> {
        sqlx::query_as("SELECT * FROM invoices WHERE invoice_number = ?1")
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BillingError::not_found("invoice", invoice_number))
    }

    /// All invoices, newest first.
    pub async fn list(&self) -> Result<Vec<Invoice>> {
        let invoices = sqlx::query_as("SELECT * FROM invoices ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(invoices)
    }
}
