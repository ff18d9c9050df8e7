//! Read-only order routes.
//!
//! GET /orders/{id} - Retrieve an order with its line items

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use sqlx::SqlitePool;
use tracing::error;

use crate::models::{ApiResponse, Order, OrderDetail, OrderItem};

/// Build the orders router.
pub fn router() -> Router {
    Router::new().route("/orders/{id}", get(get_order))
}

/// Retrieve an order by ID, including its refund status and items.
async fn get_order(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetail>>, StatusCode> {
    let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            error!("Failed to query order: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let items: Vec<OrderItem> =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = ?1 ORDER BY id")
            .bind(id)
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                error!("Failed to query order items: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

    Ok(Json(ApiResponse {
        data: OrderDetail { order, items },
        message: "Order retrieved".to_string(),
    }))
}
