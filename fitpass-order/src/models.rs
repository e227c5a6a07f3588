use chrono::{DateTime, Utc};
use fitpass_shared::money::MinorUnits;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// An individual priced position within an order. Prices here are already
/// post-discount; the order owns no money movement itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub unit_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price_minor: MinorUnits,
    pub total_minor: MinorUnits,
}

/// The purchase record created first in the saga. Owns its Booking and
/// PaymentAuthorization; compensating deletes cascade through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub total_minor: MinorUnits,
    pub currency: String,
    pub status: OrderStatus,
    pub line_items: Vec<LineItem>,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(buyer_id: Uuid, currency: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            total_minor: 0,
            currency,
            status: OrderStatus::Pending,
            line_items: Vec::new(),
            payment_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.total_minor += item.total_minor;
        self.line_items.push(item);
        self.updated_at = Utc::now();
    }
}

/// The bookable instance a customer receives: a package membership or a
/// batch of event tickets. Prices are frozen at creation from the
/// promotion engine's output and never recomputed, even if the promotion
/// is later disabled or expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub order_id: Uuid,
    pub unit_id: Uuid,
    pub quantity: i32,
    pub unit_price_minor: MinorUnits,
    pub total_minor: MinorUnits,
    /// Customer-facing code, 8 uppercase alphanumerics, globally unique.
    pub reference: String,
    /// The promotion applied at purchase time, kept so settlement can
    /// attribute the use. Frozen like the prices.
    pub promotion_id: Option<Uuid>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: Uuid,
        unit_id: Uuid,
        quantity: i32,
        unit_price_minor: MinorUnits,
        total_minor: MinorUnits,
        reference: String,
        promotion_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            unit_id,
            quantity,
            unit_price_minor,
            total_minor,
            reference,
            promotion_id,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_totals_accumulate_from_items() {
        let mut order = Order::new(Uuid::new_v4(), "THB".to_string());
        assert_eq!(order.status, OrderStatus::Pending);

        order.add_item(LineItem {
            unit_id: Uuid::new_v4(),
            description: "Evening HIIT 5-pack".to_string(),
            quantity: 2,
            unit_price_minor: 2250,
            total_minor: 4500,
        });

        assert_eq!(order.total_minor, 4500);
        assert_eq!(order.line_items.len(), 1);
    }
}
