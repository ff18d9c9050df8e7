//! Domain models for the billing services.
//!
//! These structs map to the tables created by the migrations and represent
//! orders, refunds and invoices as the services see them. Status fields are
//! closed enums stored as TEXT; monetary columns are integer minor units
//! (see [`crate::money`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Currency, Money};

// ============================================================================
// Status enums
// ============================================================================

/// Order lifecycle status. Owned by the (out-of-scope) order-management
/// layer; the refund pipeline only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    PendingCod,
    Paid,
    Preparing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PendingCod => "pending_cod",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

/// Aggregate refund position of an order, derived from its settled refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderRefundStatus {
    None,
    Partial,
    Full,
}

impl OrderRefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderRefundStatus::None => "none",
            OrderRefundStatus::Partial => "partial",
            OrderRefundStatus::Full => "full",
        }
    }
}

/// Refund lifecycle: `pending -> approved -> processed`, no skips and no
/// way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RefundState {
    Pending,
    Approved,
    Processed,
}

impl RefundState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundState::Pending => "pending",
            RefundState::Approved => "approved",
            RefundState::Processed => "processed",
        }
    }
}

impl std::fmt::Display for RefundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the money goes back to the customer. A closed enumeration with no
/// behavioral differences in this service beyond the display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RefundMethod {
    Original,
    Manual,
    Cash,
}

impl Default for RefundMethod {
    fn default() -> Self {
        RefundMethod::Original
    }
}

impl RefundMethod {
    pub fn label(&self) -> &'static str {
        match self {
            RefundMethod::Original => "original payment method",
            RefundMethod::Manual => "manual transfer",
            RefundMethod::Cash => "cash",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

// ============================================================================
// Database models (sqlx::FromRow)
// ============================================================================

/// A customer purchase, the financial record the refund pipeline works on.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub total_minor: i64,
    pub currency: Currency,
    pub payment_method: String,
    pub status: OrderStatus,
    pub refund_status: OrderRefundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn total(&self) -> Money {
        Money::new(self.total_minor, self.currency.clone())
    }
}

/// A line on an order. `product_id` is a live catalog reference; invoices
/// copy the display fields instead of keeping it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub name: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub line_total_minor: i64,
}

/// A request to return money against an order. Created once, mutated only by
/// the approve and process transitions, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Refund {
    pub id: i64,
    pub order_id: i64,
    pub invoice_id: Option<i64>,
    pub amount_minor: i64,
    pub currency: Currency,
    pub reason: String,
    pub method: RefundMethod,
    pub status: RefundState,
    pub txn_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    pub fn amount(&self) -> Money {
        Money::new(self.amount_minor, self.currency.clone())
    }
}

/// Immutable snapshot of an order at invoicing time. Only `pdf_path` is
/// written after creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub order_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub billing_address: String,
    pub subtotal_minor: i64,
    pub tax_minor: i64,
    pub shipping_minor: i64,
    pub total_minor: i64,
    pub currency: Currency,
    pub payment_method: String,
    pub status: InvoiceStatus,
    pub pdf_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn subtotal(&self) -> Money {
        Money::new(self.subtotal_minor, self.currency.clone())
    }

    pub fn tax(&self) -> Money {
        Money::new(self.tax_minor, self.currency.clone())
    }

    pub fn shipping(&self) -> Money {
        Money::new(self.shipping_minor, self.currency.clone())
    }

    pub fn total(&self) -> Money {
        Money::new(self.total_minor, self.currency.clone())
    }
}

/// Frozen copy of an order line; later product edits do not alter it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub line_total_minor: i64,
}

// ============================================================================
// Request models (Deserialize from JSON input)
// ============================================================================

/// Request body for requesting a refund against an order.
#[derive(Debug, Deserialize)]
pub struct CreateRefundRequest {
    pub order_id: i64,
    pub amount_minor: i64,
    pub reason: String,
    #[serde(default)]
    pub method: RefundMethod,
}

// ============================================================================
// Response models
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

/// An order together with its line items.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// An invoice together with its frozen line items.
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

/// Response for a rendered invoice PDF.
#[derive(Debug, Serialize)]
pub struct PdfRendered {
    pub invoice_number: String,
    pub pdf_url: String,
}
