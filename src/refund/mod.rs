//! Refund pipeline.
//!
//! `validate` holds the pure rule checks and balance arithmetic; `service`
//! drives the `pending -> approved -> processed` lifecycle against the
//! database and keeps the order-level refund status in step.

pub mod service;
pub mod validate;

pub use service::RefundService;
