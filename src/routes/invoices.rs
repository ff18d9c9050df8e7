//! Invoice routes.
//!
//! POST /orders/{id}/invoice   - Create the invoice for an order
//! POST /invoices/{id}/pdf     - Render the invoice PDF and store it
//! GET  /invoices              - List invoices, newest first
//! GET  /invoices/{key}        - Invoice detail by numeric id, or the stored
//!                               PDF when the key is `{number}.pdf`

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tracing::error;

use crate::invoice::{InvoiceService, PdfStore};
use crate::models::{ApiResponse, Invoice, InvoiceDetail, PdfRendered};
use crate::routes::error_status;

/// Build the invoices router.
pub fn router() -> Router {
    Router::new()
        .route("/orders/{id}/invoice", post(create_invoice))
        .route("/invoices", get(list_invoices))
        .route("/invoices/{key}", get(get_invoice))
        .route("/invoices/{id}/pdf", post(render_pdf))
}

/// Create the invoice snapshot for an order.
async fn create_invoice(
    Extension(invoices): Extension<InvoiceService>,
    Path(order_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceDetail>>), StatusCode> {
    let detail = invoices.create_invoice(order_id).await.map_err(|e| {
        error!("Failed to create invoice for order {}: {}", order_id, e);
        error_status(&e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: detail,
            message: "Invoice created".to_string(),
        }),
    ))
}

/// Render the PDF for an invoice and record where it was stored.
async fn render_pdf(
    Extension(invoices): Extension<InvoiceService>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PdfRendered>>, StatusCode> {
    let invoice = invoices.render_pdf(id).await.map_err(|e| {
        error!("Failed to render invoice {}: {}", id, e);
        error_status(&e)
    })?;

    let pdf_url = PdfStore::public_url(&invoice.invoice_number);
    Ok(Json(ApiResponse {
        data: PdfRendered {
            invoice_number: invoice.invoice_number,
            pdf_url,
        },
        message: "Invoice rendered".to_string(),
    }))
}

async fn list_invoices(
    Extension(invoices): Extension<InvoiceService>,
) -> Result<Json<ApiResponse<Vec<Invoice>>>, StatusCode> {
    let list = invoices.list().await.map_err(|e| {
        error!("Failed to list invoices: {}", e);
        error_status(&e)
    })?;

    Ok(Json(ApiResponse {
        data: list,
        message: "Invoices retrieved".to_string(),
    }))
}

/// Invoice detail or PDF download, depending on the key.
///
/// Invoice numbers are never purely numeric, so `/invoices/17` is a detail
/// lookup and `/invoices/BK-2026-000017.pdf` downloads the stored document.
async fn get_invoice(
    Extension(invoices): Extension<InvoiceService>,
    Path(key): Path<String>,
) -> Result<Response, StatusCode> {
    if let Some(number) = key.strip_suffix(".pdf") {
        return download_pdf(&invoices, number).await;
    }

    let id: i64 = key.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    let detail = invoices.get(id).await.map_err(|e| {
        error!("Failed to query invoice {}: {}", id, e);
        error_status(&e)
    })?;

    Ok(Json(ApiResponse {
        data: detail,
        message: "Invoice retrieved".to_string(),
    })
    .into_response())
}

async fn download_pdf(invoices: &InvoiceService, number: &str) -> Result<Response, StatusCode> {
    // 404 for unknown numbers before touching the filesystem.
    invoices.get_by_number(number).await.map_err(|e| {
        error!("Failed to query invoice {}: {}", number, e);
        error_status(&e)
    })?;

    let bytes = invoices.pdf_store().load(number).await.map_err(|e| {
        error!("Failed to read pdf for invoice {}: {}", number, e);
        error_status(&e)
    })?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}
