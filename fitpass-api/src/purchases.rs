use axum::{extract::State, http::StatusCode, Json};
use fitpass_order::{PurchaseError, PurchaseRequest};
use fitpass_shared::money::MinorUnits;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub unit_id: Uuid,
    pub quantity: i32,
    pub purchaser_id: Uuid,
    pub promotion_id: Option<Uuid>,
    #[serde(default = "default_pay_now")]
    pub pay_now: bool,
}

fn default_pay_now() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CreatePurchaseResponse {
    pub order_id: Uuid,
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub total_minor: MinorUnits,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_client_secret: Option<String>,
}

/// POST /v1/purchases
/// Run the purchase pipeline: admission check, promotion pricing, then the
/// Order -> Booking -> commission -> authorization saga.
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<CreatePurchaseResponse>), AppError> {
    let receipt = state
        .orchestrator
        .execute(PurchaseRequest {
            unit_id: req.unit_id,
            quantity: req.quantity,
            purchaser_id: req.purchaser_id,
            promotion_id: req.promotion_id,
            pay_now: req.pay_now,
        })
        .await
        .map_err(|err| match err {
            PurchaseError::Admission(admission) => AppError::Admission(admission),
            saga @ PurchaseError::Saga { .. } => saga.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePurchaseResponse {
            order_id: receipt.order_id,
            booking_id: receipt.booking_id,
            booking_reference: receipt.booking_reference,
            total_minor: receipt.total_minor,
            currency: state.business_rules.currency.clone(),
            payment_client_secret: receipt.payment_client_secret,
        }),
    ))
}
