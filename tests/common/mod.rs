//! Shared helpers for the integration suites: an in-memory database per
//! test, a seeded order, and a mailer that records instead of sending.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use oakline_billing::config::NotifyConfig;
use oakline_billing::db::MIGRATOR;
use oakline_billing::notify::{Mailer, Notifier, OutboundEmail};

/// Fresh in-memory database with the migrations applied. One connection,
/// so the memory database lives as long as the pool.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    MIGRATOR.run(&pool).await.expect("run migrations");
    pool
}

/// Captures outbound email for assertions.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl RecordingMailer {
    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.to.clone()).collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutboundEmail) -> Result<(), String> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Notifier wired to the recording mailer, with an admin address set.
pub fn test_notifier(mailer: &RecordingMailer) -> Notifier {
    Notifier::new(
        Arc::new(mailer.clone()),
        NotifyConfig {
            from_address: "Oakline Billing <billing@oakline.example>".to_string(),
            admin_address: Some("ops@oakline.example".to_string()),
        },
    )
}

/// Insert an order with the given `(name, quantity, unit_price_minor)` items;
/// the order total is their sum. Returns the order id.
pub async fn seed_order(pool: &SqlitePool, status: &str, items: &[(&str, i64, i64)]) -> i64 {
    let total: i64 = items.iter().map(|(_, qty, unit)| qty * unit).sum();
    let now = Utc::now();

    let order_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO orders (
            customer_name, customer_email, shipping_address, total_minor,
            currency, payment_method, status, refund_status, created_at, updated_at
        )
        VALUES ('Marta Lindqvist', 'marta@example.com', '12 Alder Row, Malmo',
                ?1, 'EUR', 'card', ?2, 'none', ?3, ?3)
        RETURNING id
        "#,
    )
    .bind(total)
    .bind(status)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("insert order");

    for (name, qty, unit) in items {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, name, quantity, unit_price_minor, line_total_minor)
            VALUES (?1, NULL, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(order_id)
        .bind(name)
        .bind(qty)
        .bind(unit)
        .bind(qty * unit)
        .execute(pool)
        .await
        .expect("insert order item");
    }

    order_id
}

/// The order's aggregate refund status column, as stored.
pub async fn order_refund_status(pool: &SqlitePool, order_id: i64) -> String {
    sqlx::query_scalar("SELECT refund_status FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .expect("query refund_status")
}
