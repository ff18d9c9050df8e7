//! Error taxonomy for the billing services.
//!
//! Financial-state failures (`Validation`, `NotFound`, `InvalidState`) abort
//! the operation inside its transaction and leave no partial writes. Storage
//! and PDF failures are reported after the fact and never undo committed
//! state. Notification failures are not errors at all — they surface as
//! `notify::DispatchOutcome` values.

use thiserror::Error;

use crate::models::RefundState;
use crate::refund::validate::RefundRule;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BillingError>;

#[derive(Debug, Error)]
pub enum BillingError {
    /// One or more refund rules were violated. Carries the full list, not
    /// just the first hit.
    #[error("refund validation failed: {}", join_rules(.0))]
    Validation(Vec<RefundRule>),

    /// A referenced order, refund or invoice does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A refund state transition was attempted from the wrong status.
    #[error("refund {id} cannot move to {target}: status is {actual}")]
    InvalidState {
        id: i64,
        target: RefundState,
        actual: RefundState,
    },

    /// PDF write/read/delete failure.
    #[error("invoice storage: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// PDF document assembly failure.
    #[error("invoice pdf: {0}")]
    Pdf(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

impl BillingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    /// The violated rules, when this is a validation failure.
    pub fn violations(&self) -> Option<&[RefundRule]> {
        match self {
            Self::Validation(rules) => Some(rules),
            _ => None,
        }
    }
}

fn join_rules(rules: &[RefundRule]) -> String {
    rules
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
