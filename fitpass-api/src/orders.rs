use axum::{
    extract::{Path, State},
    Json,
};
use fitpass_core::payment::RefundRequest;
use fitpass_order::models::{Booking, Order};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub refunds: Vec<RefundRequest>,
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .get_order(order_id)
        .await
        .map_err(anyhow::Error::from_boxed)?
        .ok_or_else(|| AppError::NotFound(format!("order not found: {}", order_id)))?;
    let refunds = state
        .payments
        .list_refunds(order_id)
        .await
        .map_err(anyhow::Error::from_boxed)?;

    Ok(Json(OrderResponse { order, refunds }))
}

/// GET /v1/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await
        .map_err(anyhow::Error::from_boxed)?
        .ok_or_else(|| AppError::NotFound(format!("booking not found: {}", booking_id)))?;

    Ok(Json(booking))
}
