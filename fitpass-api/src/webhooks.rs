use axum::{extract::State, http::StatusCode, Json};
use fitpass_core::payment::SettlementOutcome;
use fitpass_shared::money::MinorUnits;
use serde::Deserialize;

use crate::state::AppState;

/// Settlement callback body. Signature verification happens upstream in
/// the ingress layer; the payload arriving here is already trusted.
#[derive(Debug, Deserialize)]
pub struct SettlementCallback {
    pub external_ref: String,
    pub outcome: SettlementOutcome,
    pub amount_minor: MinorUnits,
}

/// POST /v1/webhooks/payments
/// Receive the gateway's settlement outcome. Duplicate and out-of-order
/// deliveries are absorbed as no-ops and still answered 200 so upstream
/// retries don't treat them as failures. Only store errors get a 5xx,
/// which the gateway will retry.
pub async fn handle_settlement_callback(
    State(state): State<AppState>,
    Json(payload): Json<SettlementCallback>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!(
        external_ref = %payload.external_ref,
        outcome = ?payload.outcome,
        "received settlement callback"
    );

    state
        .reconciler
        .on_callback(&payload.external_ref, payload.outcome, payload.amount_minor)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "settlement processing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(StatusCode::OK)
}
