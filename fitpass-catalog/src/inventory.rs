use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::unit::SellableUnit;

/// Advisory admission token. Holding one never debits capacity; the debit
/// happens exactly once, at settlement, via the repository's conditional
/// update. Abandoned payment flows therefore never strand inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldToken {
    pub unit_id: Uuid,
    pub quantity: i32,
    pub purchaser_id: Uuid,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("Unit {0} is not available for sale")]
    UnitUnavailable(Uuid),

    #[error("Sale window is closed for unit {0}")]
    SaleWindowClosed(Uuid),

    #[error("Quantity {requested} exceeds the per-purchaser limit of {max}")]
    LimitExceeded { requested: i32, max: i32 },

    #[error("Insufficient capacity: requested {requested}, remaining {remaining}")]
    CapacityExceeded { requested: i32, remaining: i32 },

    #[error("Promotion not applicable: {0}")]
    PromotionInvalid(String),
}

impl AdmissionError {
    /// Machine-readable code surfaced in API error bodies.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AdmissionError::UnitUnavailable(_) => "UNIT_UNAVAILABLE",
            AdmissionError::SaleWindowClosed(_) => "SALE_WINDOW_CLOSED",
            AdmissionError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            AdmissionError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AdmissionError::PromotionInvalid(_) => "PROMOTION_INVALID",
        }
    }
}

/// Read-time admission gate. Runs once at purchase time; the same capacity
/// condition is re-checked atomically at settlement, so this check admits
/// without reserving.
pub struct InventoryGuard;

impl InventoryGuard {
    pub fn check_and_hold(
        unit: &SellableUnit,
        quantity: i32,
        purchaser_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<HoldToken, AdmissionError> {
        if !unit.active {
            return Err(AdmissionError::UnitUnavailable(unit.id));
        }
        if !unit.sale_window.contains(now) {
            return Err(AdmissionError::SaleWindowClosed(unit.id));
        }
        if quantity < 1 || quantity > unit.max_per_purchaser {
            return Err(AdmissionError::LimitExceeded {
                requested: quantity,
                max: unit.max_per_purchaser,
            });
        }
        if quantity > unit.remaining_capacity() {
            return Err(AdmissionError::CapacityExceeded {
                requested: quantity,
                remaining: unit.remaining_capacity(),
            });
        }

        Ok(HoldToken {
            unit_id: unit.id,
            quantity,
            purchaser_id,
            granted_at: now,
        })
    }
}
