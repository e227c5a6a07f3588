use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AffiliateConversion, ConversionStatus};

#[async_trait]
pub trait ConversionRepository: Send + Sync {
    async fn insert_conversion(
        &self,
        conversion: &AffiliateConversion,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Compensating delete for saga rollback. Removing a booking during
    /// rollback also removes the conversion created for it.
    async fn delete_conversion(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Lookup by the booking the conversion was attributed to.
    async fn find_by_reference(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<AffiliateConversion>, Box<dyn std::error::Error + Send + Sync>>;

    /// Guarded one-way move out of Pending. Returns false when the
    /// conversion was already terminal.
    async fn transition_if_pending(
        &self,
        id: Uuid,
        to: ConversionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
pub trait ReferralRepository: Send + Sync {
    /// Record that `referred` signed up through `referring`'s affiliate code.
    async fn link_referral(
        &self,
        referring_user_id: Uuid,
        referred_user_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn find_referrer(
        &self,
        referred_user_id: Uuid,
    ) -> Result<Option<Uuid>, Box<dyn std::error::Error + Send + Sync>>;
}
