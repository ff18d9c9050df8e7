//! HTTP route modules.
//!
//! Thin glue over the billing services; every invariant lives below this
//! layer. Each module builds its own router:
//! - `orders`: read-only order views
//! - `refunds`: refund request/approve/process and listings
//! - `invoices`: invoice creation, PDF rendering and download

pub mod invoices;
pub mod orders;
pub mod refunds;

use axum::http::StatusCode;

use crate::error::BillingError;

/// Map a billing error to the HTTP status the handlers return.
pub(crate) fn error_status(err: &BillingError) -> StatusCode {
    match err {
        BillingError::Validation(_) => StatusCode::BAD_REQUEST,
        BillingError::NotFound { .. } => StatusCode::NOT_FOUND,
        BillingError::InvalidState { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
