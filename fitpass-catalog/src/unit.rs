use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitpass_shared::money::MinorUnits;
use fitpass_shared::TimeWindow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of bookable slot this is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitKind {
    GymPackage,
    EventTicket,
}

/// A sellable unit: a gym package slot or an event ticket tier.
///
/// `capacity_consumed` only moves at settlement, through the repository's
/// atomic debit, never on order creation and never on advisory holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellableUnit {
    pub id: Uuid,
    pub name: String,
    pub kind: UnitKind,
    pub capacity_total: i32,
    pub capacity_consumed: i32,
    pub price_minor: MinorUnits,
    pub currency: String,
    pub max_per_purchaser: i32,
    pub sale_window: TimeWindow,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SellableUnit {
    pub fn remaining_capacity(&self) -> i32 {
        self.capacity_total - self.capacity_consumed
    }
}

#[async_trait]
pub trait UnitRepository: Send + Sync {
    async fn upsert_unit(
        &self,
        unit: &SellableUnit,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_unit(
        &self,
        id: Uuid,
    ) -> Result<Option<SellableUnit>, Box<dyn std::error::Error + Send + Sync>>;

    /// Atomic conditional capacity debit: consumes `quantity` only when
    /// `capacity_consumed + quantity <= capacity_total`, as one guarded
    /// read-modify-write. Returns false when the debit would oversell.
    /// This is the settlement-time counterpart of the advisory admission
    /// check; two racing settlements can never both pass a stale read.
    async fn try_consume_capacity(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
