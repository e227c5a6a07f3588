use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitpass_shared::money::{self, MinorUnits};
use fitpass_shared::TimeWindow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

/// A discount campaign. At most one promotion applies per purchase; they
/// are never stacked. `current_uses` moves only on confirmed settlement,
/// through the repository's guarded increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    /// Whole percent for Percentage, minor units for FixedAmount.
    pub discount_value: i64,
    /// None means the promotion applies to every unit.
    pub applicable_unit_id: Option<Uuid>,
    pub min_purchase_minor: MinorUnits,
    /// Cap on a Percentage discount. Ignored for FixedAmount.
    pub max_discount_minor: Option<MinorUnits>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub active_window: TimeWindow,
    pub enabled: bool,
}

impl Promotion {
    pub fn has_uses_left(&self) -> bool {
        match self.max_uses {
            Some(max) => self.current_uses < max,
            None => true,
        }
    }

    /// None when eligible, otherwise the reason it cannot apply.
    /// The minimum-purchase rule is checked separately against the amount.
    fn ineligibility(&self, unit_id: Uuid, now: DateTime<Utc>) -> Option<&'static str> {
        if !self.enabled {
            return Some("promotion is disabled");
        }
        if !self.active_window.contains(now) {
            return Some("promotion is not active");
        }
        if !self.has_uses_left() {
            return Some("promotion usage limit reached");
        }
        if let Some(applicable) = self.applicable_unit_id {
            if applicable != unit_id {
                return Some("promotion does not apply to this unit");
            }
        }
        None
    }
}

/// Outcome of promotion resolution. Informational: `valid = false` never
/// aborts on its own; the caller decides whether to proceed undiscounted
/// or reject the purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountResult {
    pub original_minor: MinorUnits,
    pub discount_minor: MinorUnits,
    pub final_minor: MinorUnits,
    pub promotion_id: Option<Uuid>,
    pub valid: bool,
    pub reason: Option<String>,
}

impl DiscountResult {
    fn passthrough(amount: MinorUnits) -> Self {
        Self {
            original_minor: amount,
            discount_minor: 0,
            final_minor: amount,
            promotion_id: None,
            valid: true,
            reason: None,
        }
    }

    fn rejected(amount: MinorUnits, reason: impl Into<String>) -> Self {
        Self {
            original_minor: amount,
            discount_minor: 0,
            final_minor: amount,
            promotion_id: None,
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

pub struct PromotionEngine;

impl PromotionEngine {
    /// Resolve the applicable promotion and price a purchase.
    ///
    /// An empty candidate list means no promotion was requested and prices
    /// through unchanged. A non-empty list whose members all fail
    /// eligibility yields `valid = false` with the failure reason, so an
    /// explicitly requested promotion at its usage limit surfaces as
    /// invalid instead of being silently dropped.
    pub fn resolve(
        purchase_minor: MinorUnits,
        unit_id: Uuid,
        candidates: &[Promotion],
        now: DateTime<Utc>,
    ) -> DiscountResult {
        if candidates.is_empty() {
            return DiscountResult::passthrough(purchase_minor);
        }

        let mut last_reason = "promotion is not applicable";
        let promotion = candidates.iter().find(|p| match p.ineligibility(unit_id, now) {
            None => true,
            Some(reason) => {
                last_reason = reason;
                false
            }
        });
        let promotion = match promotion {
            Some(p) => p,
            None => return DiscountResult::rejected(purchase_minor, last_reason),
        };

        if purchase_minor < promotion.min_purchase_minor {
            return DiscountResult::rejected(
                purchase_minor,
                format!(
                    "purchase amount below the promotion minimum of {}",
                    promotion.min_purchase_minor
                ),
            );
        }

        let discount_minor = match promotion.discount_type {
            DiscountType::Percentage => {
                let raw = money::percentage_of(purchase_minor, promotion.discount_value);
                match promotion.max_discount_minor {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            // A fixed discount can never exceed the price itself.
            DiscountType::FixedAmount => promotion.discount_value.min(purchase_minor),
        };

        DiscountResult {
            original_minor: purchase_minor,
            discount_minor,
            final_minor: (purchase_minor - discount_minor).max(0),
            promotion_id: Some(promotion.id),
            valid: true,
            reason: None,
        }
    }
}

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn upsert_promotion(
        &self,
        promotion: &Promotion,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_promotion(
        &self,
        id: Uuid,
    ) -> Result<Option<Promotion>, Box<dyn std::error::Error + Send + Sync>>;

    /// Guarded increment of `current_uses`: applies only while below
    /// `max_uses`, as one atomic read-modify-write. Called at settlement
    /// time only, mirroring the capacity debit discipline.
    async fn try_increment_uses(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn percentage_promo(value: i64, cap: Option<MinorUnits>) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4(),
            code: "LAUNCH20".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: value,
            applicable_unit_id: None,
            min_purchase_minor: 0,
            max_discount_minor: cap,
            max_uses: Some(100),
            current_uses: 0,
            active_window: TimeWindow::new(now - Duration::days(1), now + Duration::days(1)),
            enabled: true,
        }
    }

    fn fixed_promo(value: MinorUnits) -> Promotion {
        let mut p = percentage_promo(0, None);
        p.code = "FLAT500".to_string();
        p.discount_type = DiscountType::FixedAmount;
        p.discount_value = value;
        p
    }

    #[test]
    fn test_no_candidates_is_valid_passthrough() {
        let result = PromotionEngine::resolve(5000, Uuid::new_v4(), &[], Utc::now());
        assert!(result.valid);
        assert_eq!(result.final_minor, 5000);
        assert_eq!(result.discount_minor, 0);
        assert!(result.promotion_id.is_none());
    }

    #[test]
    fn test_percentage_discount_capped() {
        // 20% of 5000 is 1000, capped at 500.
        let promo = percentage_promo(20, Some(500));
        let result =
            PromotionEngine::resolve(5000, Uuid::new_v4(), std::slice::from_ref(&promo), Utc::now());

        assert!(result.valid);
        assert_eq!(result.discount_minor, 500);
        assert_eq!(result.final_minor, 4500);
        assert_eq!(result.promotion_id, Some(promo.id));
    }

    #[test]
    fn test_percentage_discount_uncapped() {
        let promo = percentage_promo(20, None);
        let result = PromotionEngine::resolve(5000, Uuid::new_v4(), &[promo], Utc::now());

        assert_eq!(result.discount_minor, 1000);
        assert_eq!(result.final_minor, 4000);
    }

    #[test]
    fn test_fixed_discount_never_exceeds_price() {
        let promo = fixed_promo(500);
        let result = PromotionEngine::resolve(300, Uuid::new_v4(), &[promo], Utc::now());

        assert!(result.valid);
        assert_eq!(result.discount_minor, 300);
        assert_eq!(result.final_minor, 0);
    }

    #[test]
    fn test_below_minimum_purchase_is_invalid_without_mutation() {
        let mut promo = fixed_promo(500);
        promo.min_purchase_minor = 2000;
        let result = PromotionEngine::resolve(1500, Uuid::new_v4(), &[promo], Utc::now());

        assert!(!result.valid);
        assert_eq!(result.final_minor, 1500);
        assert!(result.reason.unwrap().contains("minimum"));
    }

    #[test]
    fn test_exhausted_promotion_is_invalid() {
        let mut promo = percentage_promo(20, None);
        promo.current_uses = 100; // at max_uses
        let result = PromotionEngine::resolve(5000, Uuid::new_v4(), &[promo], Utc::now());

        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some("promotion usage limit reached"));
        assert_eq!(result.final_minor, 5000);
    }

    #[test]
    fn test_disabled_and_expired_and_wrong_unit_are_invalid() {
        let unit_id = Uuid::new_v4();

        let mut disabled = percentage_promo(10, None);
        disabled.enabled = false;
        assert!(!PromotionEngine::resolve(5000, unit_id, &[disabled], Utc::now()).valid);

        let expired = percentage_promo(10, None);
        let after_window = expired.active_window.end + Duration::hours(1);
        assert!(!PromotionEngine::resolve(5000, unit_id, &[expired], after_window).valid);

        let mut other_unit = percentage_promo(10, None);
        other_unit.applicable_unit_id = Some(Uuid::new_v4());
        assert!(!PromotionEngine::resolve(5000, unit_id, &[other_unit], Utc::now()).valid);
    }

    #[test]
    fn test_unit_scoped_promotion_applies_to_its_unit() {
        let unit_id = Uuid::new_v4();
        let mut promo = percentage_promo(10, None);
        promo.applicable_unit_id = Some(unit_id);

        let result = PromotionEngine::resolve(5000, unit_id, &[promo], Utc::now());
        assert!(result.valid);
        assert_eq!(result.discount_minor, 500);
    }
}
