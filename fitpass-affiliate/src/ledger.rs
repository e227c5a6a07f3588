use std::sync::Arc;

use chrono::Utc;
use fitpass_core::payment::SettlementOutcome;
use fitpass_shared::money::MinorUnits;
use uuid::Uuid;

use crate::models::{AffiliateConversion, CommissionRates, ConversionStatus};
use crate::repository::{ConversionRepository, ReferralRepository};

/// Records pending commissions at purchase time and settles them exactly
/// once when the payment outcome is known.
pub struct CommissionLedger {
    conversions: Arc<dyn ConversionRepository>,
    referrals: Arc<dyn ReferralRepository>,
    rates: CommissionRates,
}

impl CommissionLedger {
    pub fn new(
        conversions: Arc<dyn ConversionRepository>,
        referrals: Arc<dyn ReferralRepository>,
        rates: CommissionRates,
    ) -> Self {
        Self {
            conversions,
            referrals,
            rates,
        }
    }

    /// Record a pending booking commission when the buyer was referred.
    /// Returns None for buyers without a referrer.
    pub async fn record_booking_pending(
        &self,
        buyer_id: Uuid,
        booking_id: Uuid,
        settled_value_minor: MinorUnits,
    ) -> Result<Option<AffiliateConversion>, Box<dyn std::error::Error + Send + Sync>> {
        let referrer = match self.referrals.find_referrer(buyer_id).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let conversion = AffiliateConversion::booking(
            referrer,
            buyer_id,
            booking_id,
            settled_value_minor,
            self.rates.booking_rate_bps,
        );
        self.conversions.insert_conversion(&conversion).await?;

        tracing::debug!(
            conversion_id = %conversion.id,
            referrer = %referrer,
            booking_id = %booking_id,
            commission_minor = conversion.commission_amount_minor,
            "recorded pending booking commission"
        );
        Ok(Some(conversion))
    }

    /// Record a signup bounty for a referred registration.
    pub async fn record_signup_pending(
        &self,
        referring_user_id: Uuid,
        referred_user_id: Uuid,
    ) -> Result<AffiliateConversion, Box<dyn std::error::Error + Send + Sync>> {
        let conversion = AffiliateConversion::signup(
            referring_user_id,
            referred_user_id,
            self.rates.signup_flat_minor,
        );
        self.conversions.insert_conversion(&conversion).await?;
        Ok(conversion)
    }

    /// Compensating delete for saga rollback: the conversion recorded in
    /// the same purchase attempt is removed along with its booking.
    pub async fn delete_pending(
        &self,
        conversion_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.conversions.delete_conversion(conversion_id).await
    }

    /// Settlement notification for a booking: Pending -> Confirmed on
    /// success, Pending -> Voided on failure or cancellation. A booking
    /// without a conversion, or one already settled, is a no-op.
    pub async fn settle_booking(
        &self,
        booking_id: Uuid,
        outcome: SettlementOutcome,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let conversion = match self.conversions.find_by_reference(booking_id).await? {
            Some(c) => c,
            None => return Ok(()),
        };

        let to = match outcome {
            SettlementOutcome::Succeeded => ConversionStatus::Confirmed,
            SettlementOutcome::Failed => ConversionStatus::Voided,
        };

        let applied = self
            .conversions
            .transition_if_pending(conversion.id, to, Utc::now())
            .await?;

        if applied {
            tracing::info!(
                conversion_id = %conversion.id,
                booking_id = %booking_id,
                status = ?to,
                "settled affiliate commission"
            );
        } else {
            tracing::debug!(
                conversion_id = %conversion.id,
                "commission already settled, ignoring"
            );
        }
        Ok(())
    }
}
