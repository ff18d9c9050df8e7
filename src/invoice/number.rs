//! Invoice number allocation.
//!
//! External format: `BK-{year}-{sequence}`, sequence zero-padded to six
//! digits. The sequence comes from a per-year counter row that is bumped
//! inside the invoicing transaction, so numbers are unique and monotonic per
//! year instead of relying on timestamp digits that can collide within a
//! millisecond.

use chrono::{Datelike, Utc};
use sqlx::{Sqlite, Transaction};

use crate::error::Result;

/// Render an invoice number from its parts.
pub fn format_invoice_number(year: i32, seq: i64) -> String {
    format!("BK-{year}-{seq:06}")
}

/// Allocate the next invoice number for the current year.
///
/// Must run inside the invoicing transaction: the counter bump commits or
/// rolls back together with the invoice itself, so failed invoicing does not
/// burn numbers.
pub async fn next_invoice_number(tx: &mut Transaction<'_, Sqlite>) -> Result<String> {
    let year = Utc::now().year();
    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_counters (year, last_seq) VALUES (?1, 1)
        ON CONFLICT (year) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(year)
    .fetch_one(&mut **tx)
    .await?;

    Ok(format_invoice_number(year, seq))
}
