//! # Oakline Billing
//!
//! Refund and invoicing services for the Oakline furniture store backend:
//! refund validation and lifecycle, invoice snapshots with PDF rendering,
//! and best-effort lifecycle notifications. The library is the product; the
//! binary in `main.rs` only wires it to HTTP.
//!
//! Exposing the router from the library lets integration tests drive the
//! full application in-process, without a running server.

pub mod config;
pub mod db;
pub mod error;
pub mod invoice;
pub mod models;
pub mod money;
pub mod notify;
pub mod refund;
pub mod routes;

use axum::{Extension, Router};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::invoice::InvoiceService;
use crate::refund::RefundService;

/// Build the Axum router with all route modules and middleware.
///
/// The caller provides a connected, migrated pool and the two services;
/// this function does not start a server.
pub fn create_app(pool: SqlitePool, refunds: RefundService, invoices: InvoiceService) -> Router {
    Router::new()
        .merge(routes::orders::router())
        .merge(routes::refunds::router())
        .merge(routes::invoices::router())
        .layer(Extension(pool))
        .layer(Extension(refunds))
        .layer(Extension(invoices))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
