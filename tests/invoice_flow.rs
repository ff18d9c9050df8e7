//! # Invoice pipeline tests
//!
//! Invoice creation against an in-memory database: totals reconciliation,
//! status derivation, snapshot freezing, number allocation, and the PDF
//! render/store/attach step.

mod common;

use chrono::{Datelike, Utc};
use common::{seed_order, test_notifier, test_pool, RecordingMailer};
use oakline_billing::error::BillingError;
use oakline_billing::invoice::{InvoiceService, PdfStore};
use oakline_billing::models::InvoiceStatus;
use tempfile::TempDir;

async fn service() -> (InvoiceService, RecordingMailer, sqlx::SqlitePool, TempDir) {
    let pool = test_pool().await;
    let mailer = RecordingMailer::default();
    let dir = tempfile::tempdir().unwrap();
    let service = InvoiceService::new(
        pool.clone(),
        PdfStore::new(dir.path().join("invoices")),
        test_notifier(&mailer),
    );
    (service, mailer, pool, dir)
}

#[tokio::test]
async fn test_totals_reconcile() {
    let (service, _mailer, pool, _dir) = service().await;
    // subtotal 100.00
    let order_id = seed_order(
        &pool,
        "paid",
        &[("Oak chair", 2, 3_500), ("Side table", 1, 3_000)],
    )
    .await;

    let detail = service.create_invoice(order_id).await.unwrap();
    let invoice = &detail.invoice;

    assert_eq!(invoice.subtotal_minor, 10_000);
    assert_eq!(invoice.tax_minor, 2_000);
    assert_eq!(invoice.shipping_minor, 0);
    assert_eq!(invoice.total_minor, 12_000);
    assert_eq!(
        invoice.total_minor,
        invoice.subtotal_minor + invoice.tax_minor + invoice.shipping_minor
    );
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.payment_method, "Credit / debit card");
    assert_eq!(detail.items.len(), 2);
}

#[tokio::test]
async fn test_status_derivation_from_order() {
    let (service, _mailer, pool, _dir) = service().await;

    let pending = seed_order(&pool, "pending_payment", &[("Bench", 1, 20_000)]).await;
    let shipped = seed_order(&pool, "shipped", &[("Bench", 1, 20_000)]).await;

    let a = service.create_invoice(pending).await.unwrap();
    let b = service.create_invoice(shipped).await.unwrap();

    assert_eq!(a.invoice.status, InvoiceStatus::Pending);
    assert_eq!(b.invoice.status, InvoiceStatus::Draft);
}

#[tokio::test]
async fn test_invoice_computation_is_idempotent() {
    let (service, _mailer, pool, _dir) = service().await;
    let order_id = seed_order(&pool, "paid", &[("Corner sofa", 1, 175_000)]).await;

    let first = service.create_invoice(order_id).await.unwrap();
    let second = service.create_invoice(order_id).await.unwrap();

    assert_eq!(first.invoice.subtotal_minor, second.invoice.subtotal_minor);
    assert_eq!(first.invoice.tax_minor, second.invoice.tax_minor);
    assert_eq!(first.invoice.total_minor, second.invoice.total_minor);
    assert_ne!(first.invoice.invoice_number, second.invoice.invoice_number);
}

#[tokio::test]
async fn test_invoice_numbers_are_sequential_per_year() {
    let (service, _mailer, pool, _dir) = service().await;
    let order_id = seed_order(&pool, "paid", &[("Lamp", 1, 8_000)]).await;

    let year = Utc::now().year();
    let a = service.create_invoice(order_id).await.unwrap();
    let b = service.create_invoice(order_id).await.unwrap();

    assert_eq!(a.invoice.invoice_number, format!("BK-{year}-000001"));
    assert_eq!(b.invoice.invoice_number, format!("BK-{year}-000002"));
}

#[tokio::test]
async fn test_items_are_frozen_at_invoicing_time() {
    let (service, _mailer, pool, _dir) = service().await;
    let order_id = seed_order(&pool, "paid", &[("Maple crib", 1, 42_000)]).await;

    let detail = service.create_invoice(order_id).await.unwrap();

    // Rename and reprice the live order item afterwards.
    sqlx::query("UPDATE order_items SET name = 'Renamed product', unit_price_minor = 1 WHERE order_id = ?1")
        .bind(order_id)
        .execute(&pool)
        .await
        .unwrap();

    let reloaded = service.get(detail.invoice.id).await.unwrap();
    assert_eq!(reloaded.items[0].name, "Maple crib");
    assert_eq!(reloaded.items[0].unit_price_minor, 42_000);
    assert_eq!(reloaded.invoice.subtotal_minor, 42_000);
}

#[tokio::test]
async fn test_render_pdf_stores_and_records_path() {
    let (service, _mailer, pool, _dir) = service().await;
    let order_id = seed_order(&pool, "paid", &[("Dresser", 1, 65_000)]).await;

    let detail = service.create_invoice(order_id).await.unwrap();
    assert!(detail.invoice.pdf_path.is_none());

    let rendered = service.render_pdf(detail.invoice.id).await.unwrap();
    let number = &rendered.invoice_number;

    assert!(rendered.pdf_path.is_some());
    assert!(service.pdf_store().exists(number).await);

    let bytes = service.pdf_store().load(number).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    service.pdf_store().delete(number).await.unwrap();
    assert!(!service.pdf_store().exists(number).await);
}

#[tokio::test]
async fn test_create_invoice_for_missing_order() {
    let (service, _mailer, _pool, _dir) = service().await;
    let err = service.create_invoice(4_242).await.unwrap_err();
    assert!(matches!(err, BillingError::NotFound { .. }));
}

#[tokio::test]
async fn test_invoice_email_goes_to_customer() {
    let (service, mailer, pool, _dir) = service().await;
    let order_id = seed_order(&pool, "paid", &[("Mirror", 1, 12_000)]).await;

    let detail = service.create_invoice(order_id).await.unwrap();

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "marta@example.com");
    assert!(sent[0].subject.contains(&detail.invoice.invoice_number));
    assert!(sent[0]
        .text
        .contains(&format!("/invoices/{}.pdf", detail.invoice.invoice_number)));
}
