//! Refund routes.
//!
//! POST /refunds               - Request a refund against an order
//! GET  /refunds               - List refunds, newest first
//! GET  /refunds/{id}          - Retrieve one refund
//! POST /refunds/{id}/approve  - Approve a pending refund
//! POST /refunds/{id}/process  - Process an approved refund
//! GET  /orders/{id}/refunds   - List an order's refunds, newest first

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tracing::error;

use crate::models::{ApiResponse, CreateRefundRequest, Refund};
use crate::refund::RefundService;
use crate::routes::error_status;

/// Build the refunds router.
pub fn router() -> Router {
    Router::new()
        .route("/refunds", post(create_refund).get(list_refunds))
        .route("/refunds/{id}", get(get_refund))
        .route("/refunds/{id}/approve", post(approve_refund))
        .route("/refunds/{id}/process", post(process_refund))
        .route("/orders/{id}/refunds", get(order_refunds))
}

/// Request a refund. The service validates the amount against the order and
/// its refund history and persists the request as `pending`.
async fn create_refund(
    Extension(refunds): Extension<RefundService>,
    Json(req): Json<CreateRefundRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Refund>>), StatusCode> {
    let refund = refunds
        .request_refund(req.order_id, req.amount_minor, &req.reason, req.method)
        .await
        .map_err(|e| {
            error!("Failed to create refund: {}", e);
            error_status(&e)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: refund,
            message: "Refund requested".to_string(),
        }),
    ))
}

async fn list_refunds(
    Extension(refunds): Extension<RefundService>,
) -> Result<Json<ApiResponse<Vec<Refund>>>, StatusCode> {
    let list = refunds.list().await.map_err(|e| {
        error!("Failed to list refunds: {}", e);
        error_status(&e)
    })?;

    Ok(Json(ApiResponse {
        data: list,
        message: "Refunds retrieved".to_string(),
    }))
}

async fn get_refund(
    Extension(refunds): Extension<RefundService>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Refund>>, StatusCode> {
    let refund = refunds.get(id).await.map_err(|e| {
        error!("Failed to query refund: {}", e);
        error_status(&e)
    })?;

    Ok(Json(ApiResponse {
        data: refund,
        message: "Refund retrieved".to_string(),
    }))
}

async fn approve_refund(
    Extension(refunds): Extension<RefundService>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Refund>>, StatusCode> {
    let refund = refunds.approve(id).await.map_err(|e| {
        error!("Failed to approve refund {}: {}", id, e);
        error_status(&e)
    })?;

    Ok(Json(ApiResponse {
        data: refund,
        message: "Refund approved".to_string(),
    }))
}

async fn process_refund(
    Extension(refunds): Extension<RefundService>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Refund>>, StatusCode> {
    let refund = refunds.process(id).await.map_err(|e| {
        error!("Failed to process refund {}: {}", id, e);
        error_status(&e)
    })?;

    Ok(Json(ApiResponse {
        data: refund,
        message: "Refund processed".to_string(),
    }))
}

async fn order_refunds(
    Extension(refunds): Extension<RefundService>,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Refund>>>, StatusCode> {
    let list = refunds.list_for_order(order_id).await.map_err(|e| {
        error!("Failed to list refunds for order {}: {}", order_id, e);
        error_status(&e)
    })?;

    Ok(Json(ApiResponse {
        data: list,
        message: "Refunds retrieved".to_string(),
    }))
}
