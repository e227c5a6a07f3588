use chrono::{DateTime, Utc};
use fitpass_shared::money::{self, MinorUnits};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionType {
    Signup,
    Booking,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionStatus {
    Pending,
    Confirmed,
    Voided,
}

/// Commission rate table, supplied by configuration and keyed by
/// conversion type: bookings earn a share of the settled amount,
/// signups a flat bounty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionRates {
    pub booking_rate_bps: i64,
    pub signup_flat_minor: MinorUnits,
}

impl Default for CommissionRates {
    fn default() -> Self {
        Self {
            booking_rate_bps: 500, // 5%
            signup_flat_minor: 5_000,
        }
    }
}

/// A commission owed to a referrer. Created Pending during the purchase
/// saga and moved exactly once to Confirmed or Voided at settlement.
/// Only Confirmed conversions count towards payouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateConversion {
    pub id: Uuid,
    pub referring_user_id: Uuid,
    pub referred_user_id: Uuid,
    pub conversion_type: ConversionType,
    /// Booking id for Booking conversions. Non-owning back-reference.
    pub reference_id: Option<Uuid>,
    pub conversion_value_minor: MinorUnits,
    pub commission_rate_bps: i64,
    pub commission_amount_minor: MinorUnits,
    pub status: ConversionStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AffiliateConversion {
    pub fn booking(
        referring_user_id: Uuid,
        referred_user_id: Uuid,
        booking_id: Uuid,
        conversion_value_minor: MinorUnits,
        rate_bps: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            referring_user_id,
            referred_user_id,
            conversion_type: ConversionType::Booking,
            reference_id: Some(booking_id),
            conversion_value_minor,
            commission_rate_bps: rate_bps,
            commission_amount_minor: money::basis_points_of(conversion_value_minor, rate_bps),
            status: ConversionStatus::Pending,
            confirmed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn signup(referring_user_id: Uuid, referred_user_id: Uuid, flat_minor: MinorUnits) -> Self {
        Self {
            id: Uuid::new_v4(),
            referring_user_id,
            referred_user_id,
            conversion_type: ConversionType::Signup,
            reference_id: None,
            conversion_value_minor: 0,
            commission_rate_bps: 0,
            commission_amount_minor: flat_minor,
            status: ConversionStatus::Pending,
            confirmed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Pending -> Confirmed. Returns false when already terminal; a
    /// settled conversion is never reopened.
    pub fn confirm(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != ConversionStatus::Pending {
            return false;
        }
        self.status = ConversionStatus::Confirmed;
        self.confirmed_at = Some(at);
        true
    }

    /// Pending -> Voided. Returns false when already terminal.
    pub fn void(&mut self) -> bool {
        if self.status != ConversionStatus::Pending {
            return false;
        }
        self.status = ConversionStatus::Voided;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_commission_from_rate_table() {
        let conversion =
            AffiliateConversion::booking(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 4500, 500);

        assert_eq!(conversion.conversion_type, ConversionType::Booking);
        assert_eq!(conversion.commission_amount_minor, 225);
        assert_eq!(conversion.status, ConversionStatus::Pending);
        assert!(conversion.confirmed_at.is_none());
    }

    #[test]
    fn test_transitions_are_one_way() {
        let mut conversion =
            AffiliateConversion::booking(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 1000, 500);

        assert!(conversion.confirm(Utc::now()));
        assert_eq!(conversion.status, ConversionStatus::Confirmed);
        assert!(conversion.confirmed_at.is_some());

        // Terminal: no reopening, no flip to voided.
        assert!(!conversion.void());
        assert!(!conversion.confirm(Utc::now()));
        assert_eq!(conversion.status, ConversionStatus::Confirmed);
    }

    #[test]
    fn test_voided_stays_voided() {
        let mut conversion =
            AffiliateConversion::booking(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 1000, 500);

        assert!(conversion.void());
        assert!(!conversion.confirm(Utc::now()));
        assert_eq!(conversion.status, ConversionStatus::Voided);
        assert!(conversion.confirmed_at.is_none());
    }

    #[test]
    fn test_signup_uses_flat_bounty() {
        let conversion = AffiliateConversion::signup(Uuid::new_v4(), Uuid::new_v4(), 5000);
        assert_eq!(conversion.conversion_type, ConversionType::Signup);
        assert_eq!(conversion.commission_amount_minor, 5000);
        assert!(conversion.reference_id.is_none());
    }
}
