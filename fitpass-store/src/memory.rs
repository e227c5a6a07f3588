use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use fitpass_affiliate::models::{AffiliateConversion, ConversionStatus};
use fitpass_affiliate::repository::{ConversionRepository, ReferralRepository};
use fitpass_catalog::promotion::{Promotion, PromotionRepository};
use fitpass_catalog::unit::{SellableUnit, UnitRepository};
use fitpass_core::payment::{
    PaymentAuthorization, PaymentRepository, PaymentStatus, RefundRequest, SettlementClaim,
};
use fitpass_order::models::{Booking, BookingStatus, Order, OrderStatus};
use fitpass_order::repository::{BookingRepository, OrderRepository};

#[derive(Default)]
struct StoreInner {
    units: HashMap<Uuid, SellableUnit>,
    promotions: HashMap<Uuid, Promotion>,
    orders: HashMap<Uuid, Order>,
    bookings: HashMap<Uuid, Booking>,
    booking_by_order: HashMap<Uuid, Uuid>,
    references: HashSet<String>,
    authorizations: HashMap<String, PaymentAuthorization>,
    authorization_by_order: HashMap<Uuid, String>,
    refunds: Vec<RefundRequest>,
    conversions: HashMap<Uuid, AffiliateConversion>,
    conversion_by_booking: HashMap<Uuid, Uuid>,
    referrers: HashMap<Uuid, Uuid>,
}

/// In-memory store backing every repository trait. Each guarded counter
/// update (capacity debit, promotion uses, status compare-and-set) runs as
/// a single write-locked read-modify-write; a SQL implementation would
/// express the same guards as conditional UPDATEs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().expect("store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().expect("store lock poisoned")
    }

    pub fn order_count(&self) -> usize {
        self.read().orders.len()
    }

    pub fn booking_count(&self) -> usize {
        self.read().bookings.len()
    }

    pub fn conversion_count(&self) -> usize {
        self.read().conversions.len()
    }
}

#[async_trait]
impl UnitRepository for MemoryStore {
    async fn upsert_unit(
        &self,
        unit: &SellableUnit,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write().units.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn get_unit(
        &self,
        id: Uuid,
    ) -> Result<Option<SellableUnit>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read().units.get(&id).cloned())
    }

    async fn try_consume_capacity(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let unit = inner
            .units
            .get_mut(&id)
            .ok_or_else(|| format!("unit not found: {}", id))?;

        if unit.capacity_consumed + quantity > unit.capacity_total {
            return Ok(false);
        }
        unit.capacity_consumed += quantity;
        unit.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl PromotionRepository for MemoryStore {
    async fn upsert_promotion(
        &self,
        promotion: &Promotion,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write().promotions.insert(promotion.id, promotion.clone());
        Ok(())
    }

    async fn get_promotion(
        &self,
        id: Uuid,
    ) -> Result<Option<Promotion>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read().promotions.get(&id).cloned())
    }

    async fn try_increment_uses(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let promotion = inner
            .promotions
            .get_mut(&id)
            .ok_or_else(|| format!("promotion not found: {}", id))?;

        if !promotion.has_uses_left() {
            return Ok(false);
        }
        promotion.current_uses += 1;
        Ok(true)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write().orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read().orders.get(&id).cloned())
    }

    async fn delete_order(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write().orders.remove(&id);
        Ok(())
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let order = inner
            .orders
            .get_mut(&id)
            .ok_or_else(|| format!("order not found: {}", id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn set_payment_ref(
        &self,
        id: Uuid,
        payment_ref: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let order = inner
            .orders
            .get_mut(&id)
            .ok_or_else(|| format!("order not found: {}", id))?;
        order.payment_ref = Some(payment_ref.to_string());
        order.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        if !inner.references.insert(booking.reference.clone()) {
            return Err(format!("duplicate booking reference: {}", booking.reference).into());
        }
        inner.booking_by_order.insert(booking.order_id, booking.id);
        inner.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read().bookings.get(&id).cloned())
    }

    async fn get_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let inner = self.read();
        let booking = inner
            .booking_by_order
            .get(&order_id)
            .and_then(|id| inner.bookings.get(id))
            .cloned();
        Ok(booking)
    }

    async fn delete_booking(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        if let Some(booking) = inner.bookings.remove(&id) {
            inner.references.remove(&booking.reference);
            inner.booking_by_order.remove(&booking.order_id);
        }
        Ok(())
    }

    async fn set_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| format!("booking not found: {}", id))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn reference_exists(
        &self,
        reference: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read().references.contains(reference))
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn insert_authorization(
        &self,
        auth: &PaymentAuthorization,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        if inner.authorization_by_order.contains_key(&auth.order_id) {
            return Err(format!("order already has an authorization: {}", auth.order_id).into());
        }
        inner
            .authorization_by_order
            .insert(auth.order_id, auth.external_ref.clone());
        inner
            .authorizations
            .insert(auth.external_ref.clone(), auth.clone());
        Ok(())
    }

    async fn get_by_external_ref(
        &self,
        external_ref: &str,
    ) -> Result<Option<PaymentAuthorization>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read().authorizations.get(external_ref).cloned())
    }

    async fn get_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PaymentAuthorization>, Box<dyn std::error::Error + Send + Sync>> {
        let inner = self.read();
        let auth = inner
            .authorization_by_order
            .get(&order_id)
            .and_then(|external_ref| inner.authorizations.get(external_ref))
            .cloned();
        Ok(auth)
    }

    async fn transition_if_pending(
        &self,
        external_ref: &str,
        to: PaymentStatus,
    ) -> Result<SettlementClaim, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let auth = inner
            .authorizations
            .get_mut(external_ref)
            .ok_or_else(|| format!("authorization not found: {}", external_ref))?;

        if auth.status != PaymentStatus::Pending {
            return Ok(SettlementClaim::AlreadySettled(auth.status));
        }
        auth.status = to;
        auth.updated_at = Utc::now();
        Ok(SettlementClaim::Claimed)
    }

    async fn mark_failed(
        &self,
        external_ref: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let auth = inner
            .authorizations
            .get_mut(external_ref)
            .ok_or_else(|| format!("authorization not found: {}", external_ref))?;
        auth.status = PaymentStatus::Failed;
        auth.updated_at = Utc::now();
        Ok(())
    }

    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PaymentAuthorization>, Box<dyn std::error::Error + Send + Sync>> {
        let inner = self.read();
        Ok(inner
            .authorizations
            .values()
            .filter(|a| a.status == PaymentStatus::Pending && a.created_at < cutoff)
            .cloned()
            .collect())
    }

    async fn record_refund(
        &self,
        refund: &RefundRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write().refunds.push(refund.clone());
        Ok(())
    }

    async fn list_refunds(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RefundRequest>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .read()
            .refunds
            .iter()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConversionRepository for MemoryStore {
    async fn insert_conversion(
        &self,
        conversion: &AffiliateConversion,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        if let Some(booking_id) = conversion.reference_id {
            inner.conversion_by_booking.insert(booking_id, conversion.id);
        }
        inner.conversions.insert(conversion.id, conversion.clone());
        Ok(())
    }

    async fn delete_conversion(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        if let Some(conversion) = inner.conversions.remove(&id) {
            if let Some(booking_id) = conversion.reference_id {
                inner.conversion_by_booking.remove(&booking_id);
            }
        }
        Ok(())
    }

    async fn find_by_reference(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<AffiliateConversion>, Box<dyn std::error::Error + Send + Sync>> {
        let inner = self.read();
        let conversion = inner
            .conversion_by_booking
            .get(&booking_id)
            .and_then(|id| inner.conversions.get(id))
            .cloned();
        Ok(conversion)
    }

    async fn transition_if_pending(
        &self,
        id: Uuid,
        to: ConversionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.write();
        let conversion = inner
            .conversions
            .get_mut(&id)
            .ok_or_else(|| format!("conversion not found: {}", id))?;

        let applied = match to {
            ConversionStatus::Confirmed => conversion.confirm(at),
            ConversionStatus::Voided => conversion.void(),
            ConversionStatus::Pending => false,
        };
        Ok(applied)
    }
}

#[async_trait]
impl ReferralRepository for MemoryStore {
    async fn link_referral(
        &self,
        referring_user_id: Uuid,
        referred_user_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write()
            .referrers
            .insert(referred_user_id, referring_user_id);
        Ok(())
    }

    async fn find_referrer(
        &self,
        referred_user_id: Uuid,
    ) -> Result<Option<Uuid>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read().referrers.get(&referred_user_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fitpass_catalog::unit::UnitKind;
    use fitpass_shared::TimeWindow;

    fn seed_unit(store: &MemoryStore, total: i32) -> Uuid {
        let now = Utc::now();
        let unit = SellableUnit {
            id: Uuid::new_v4(),
            name: "Launch Night GA".to_string(),
            kind: UnitKind::EventTicket,
            capacity_total: total,
            capacity_consumed: 0,
            price_minor: 80_000,
            currency: "THB".to_string(),
            max_per_purchaser: 10,
            sale_window: TimeWindow::new(now - Duration::days(1), now + Duration::days(1)),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let id = unit.id;
        store.write().units.insert(id, unit);
        id
    }

    #[tokio::test]
    async fn test_capacity_debit_is_conditional() {
        let store = MemoryStore::new();
        let unit_id = seed_unit(&store, 3);

        assert!(store.try_consume_capacity(unit_id, 2).await.unwrap());
        assert!(!store.try_consume_capacity(unit_id, 2).await.unwrap());
        assert!(store.try_consume_capacity(unit_id, 1).await.unwrap());

        let unit = store.get_unit(unit_id).await.unwrap().unwrap();
        assert_eq!(unit.capacity_consumed, 3);
    }

    #[tokio::test]
    async fn test_authorization_cas_admits_one_caller() {
        let store = MemoryStore::new();
        let auth = PaymentAuthorization::new(
            Uuid::new_v4(),
            4500,
            "THB".to_string(),
            "ref_1".to_string(),
            None,
        );
        store.insert_authorization(&auth).await.unwrap();

        let first = fitpass_core::PaymentRepository::transition_if_pending(
            &store,
            "ref_1",
            PaymentStatus::Succeeded,
        )
        .await
        .unwrap();
        assert_eq!(first, SettlementClaim::Claimed);

        let second = fitpass_core::PaymentRepository::transition_if_pending(
            &store,
            "ref_1",
            PaymentStatus::Failed,
        )
        .await
        .unwrap();
        assert_eq!(
            second,
            SettlementClaim::AlreadySettled(PaymentStatus::Succeeded)
        );
    }

    #[tokio::test]
    async fn test_one_authorization_per_order() {
        let store = MemoryStore::new();
        let order_id = Uuid::new_v4();
        let auth =
            PaymentAuthorization::new(order_id, 100, "THB".to_string(), "ref_a".to_string(), None);
        store.insert_authorization(&auth).await.unwrap();

        let duplicate =
            PaymentAuthorization::new(order_id, 100, "THB".to_string(), "ref_b".to_string(), None);
        assert!(store.insert_authorization(&duplicate).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_booking_frees_its_reference() {
        let store = MemoryStore::new();
        let booking = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            1000,
            1000,
            "AB12CD34".to_string(),
            None,
        );
        store.insert_booking(&booking).await.unwrap();
        assert!(store.reference_exists("AB12CD34").await.unwrap());

        store.delete_booking(booking.id).await.unwrap();
        assert!(!store.reference_exists("AB12CD34").await.unwrap());
    }

    #[tokio::test]
    async fn test_promotion_uses_never_pass_the_cap() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let promotion = Promotion {
            id: Uuid::new_v4(),
            code: "CAP2".to_string(),
            discount_type: fitpass_catalog::promotion::DiscountType::Percentage,
            discount_value: 10,
            applicable_unit_id: None,
            min_purchase_minor: 0,
            max_discount_minor: None,
            max_uses: Some(2),
            current_uses: 0,
            active_window: TimeWindow::new(now - Duration::days(1), now + Duration::days(1)),
            enabled: true,
        };
        store.upsert_promotion(&promotion).await.unwrap();

        assert!(store.try_increment_uses(promotion.id).await.unwrap());
        assert!(store.try_increment_uses(promotion.id).await.unwrap());
        assert!(!store.try_increment_uses(promotion.id).await.unwrap());

        let stored = store.get_promotion(promotion.id).await.unwrap().unwrap();
        assert_eq!(stored.current_uses, 2);
    }
}
