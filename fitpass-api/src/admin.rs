use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use fitpass_catalog::promotion::{DiscountType, Promotion};
use fitpass_catalog::unit::{SellableUnit, UnitKind};
use fitpass_shared::money::MinorUnits;
use fitpass_shared::TimeWindow;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUnitRequest {
    pub name: String,
    pub kind: UnitKind,
    pub capacity_total: i32,
    pub price_minor: MinorUnits,
    pub max_per_purchaser: i32,
    pub sale_start: DateTime<Utc>,
    pub sale_end: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// POST /v1/admin/units
pub async fn create_unit(
    State(state): State<AppState>,
    Json(req): Json<CreateUnitRequest>,
) -> Result<(StatusCode, Json<SellableUnit>), AppError> {
    let now = Utc::now();
    let unit = SellableUnit {
        id: Uuid::new_v4(),
        name: req.name,
        kind: req.kind,
        capacity_total: req.capacity_total,
        capacity_consumed: 0,
        price_minor: req.price_minor,
        currency: state.business_rules.currency.clone(),
        max_per_purchaser: req.max_per_purchaser,
        sale_window: TimeWindow::new(req.sale_start, req.sale_end),
        active: req.active,
        created_at: now,
        updated_at: now,
    };
    state
        .units
        .upsert_unit(&unit)
        .await
        .map_err(anyhow::Error::from_boxed)?;

    Ok((StatusCode::CREATED, Json(unit)))
}

#[derive(Debug, Deserialize)]
pub struct CreatePromotionRequest {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub applicable_unit_id: Option<Uuid>,
    #[serde(default)]
    pub min_purchase_minor: MinorUnits,
    pub max_discount_minor: Option<MinorUnits>,
    pub max_uses: Option<i32>,
    pub active_start: DateTime<Utc>,
    pub active_end: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub enabled: bool,
}

/// POST /v1/admin/promotions
pub async fn create_promotion(
    State(state): State<AppState>,
    Json(req): Json<CreatePromotionRequest>,
) -> Result<(StatusCode, Json<Promotion>), AppError> {
    let promotion = Promotion {
        id: Uuid::new_v4(),
        code: req.code,
        discount_type: req.discount_type,
        discount_value: req.discount_value,
        applicable_unit_id: req.applicable_unit_id,
        min_purchase_minor: req.min_purchase_minor,
        max_discount_minor: req.max_discount_minor,
        max_uses: req.max_uses,
        current_uses: 0,
        active_window: TimeWindow::new(req.active_start, req.active_end),
        enabled: req.enabled,
    };
    state
        .promotions
        .upsert_promotion(&promotion)
        .await
        .map_err(anyhow::Error::from_boxed)?;

    Ok((StatusCode::CREATED, Json(promotion)))
}

#[derive(Debug, Deserialize)]
pub struct LinkReferralRequest {
    pub referring_user_id: Uuid,
    pub referred_user_id: Uuid,
}

/// POST /v1/admin/referrals
/// Links the referred account and records the pending signup bounty for
/// the referrer in the same request.
pub async fn link_referral(
    State(state): State<AppState>,
    Json(req): Json<LinkReferralRequest>,
) -> Result<(StatusCode, Json<fitpass_affiliate::AffiliateConversion>), AppError> {
    state
        .referrals
        .link_referral(req.referring_user_id, req.referred_user_id)
        .await
        .map_err(anyhow::Error::from_boxed)?;
    let conversion = state
        .ledger
        .record_signup_pending(req.referring_user_id, req.referred_user_id)
        .await
        .map_err(anyhow::Error::from_boxed)?;

    Ok((StatusCode::CREATED, Json(conversion)))
}
