mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{harness, harness_with_gateway, seed_percentage_promotion, seed_unit};
use fitpass_affiliate::repository::ReferralRepository;
use fitpass_affiliate::ConversionStatus;
use fitpass_catalog::inventory::AdmissionError;
use fitpass_core::payment::{GatewayAuthorization, PaymentGateway, PaymentRepository};
use fitpass_catalog::unit::UnitRepository;
use fitpass_order::models::{BookingStatus, OrderStatus};
use fitpass_order::repository::{BookingRepository, OrderRepository};
use fitpass_order::{PurchaseError, PurchaseRequest};
use fitpass_shared::money::MinorUnits;
use fitpass_shared::reference;
use uuid::Uuid;

fn purchase(unit_id: Uuid, quantity: i32, promotion_id: Option<Uuid>) -> PurchaseRequest {
    PurchaseRequest {
        unit_id,
        quantity,
        purchaser_id: Uuid::new_v4(),
        promotion_id,
        pay_now: true,
    }
}

#[tokio::test]
async fn test_pay_now_purchase_creates_consistent_records() {
    let h = harness();
    let unit = seed_unit(&h.store, 10, 150_000).await;

    let receipt = h
        .orchestrator
        .execute(purchase(unit.id, 2, None))
        .await
        .unwrap();

    assert_eq!(receipt.total_minor, 300_000);
    assert!(reference::is_valid(&receipt.booking_reference));
    assert!(receipt.payment_client_secret.is_some());

    let order = h
        .store
        .get_order(receipt.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_minor, 300_000);
    assert!(order.payment_ref.is_some());

    let booking = h
        .store
        .get_booking(receipt.booking_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.order_id, order.id);
    assert_eq!(booking.quantity, 2);
    assert_eq!(booking.total_minor, 300_000);

    let auth = h
        .store
        .get_for_order(receipt.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(auth.amount_minor, 300_000);

    // Advisory admission: nothing consumed until settlement.
    let unit = h.store.get_unit(unit.id).await.unwrap().unwrap();
    assert_eq!(unit.capacity_consumed, 0);
}

#[tokio::test]
async fn test_discounted_price_is_frozen_on_the_booking() {
    let h = harness();
    let unit = seed_unit(&h.store, 10, 2500).await;
    // 20% of 5000 is 1000, capped at 500.
    let promotion = seed_percentage_promotion(&h.store, 20, Some(500), None).await;

    let receipt = h
        .orchestrator
        .execute(purchase(unit.id, 2, Some(promotion.id)))
        .await
        .unwrap();

    assert_eq!(receipt.total_minor, 4500);
    let booking = h
        .store
        .get_booking(receipt.booking_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(booking.total_minor, 4500);
    assert_eq!(booking.unit_price_minor, 2250);
    assert_eq!(booking.promotion_id, Some(promotion.id));

    // Disabling the promotion afterwards must not touch the stored price.
    let mut disabled = promotion.clone();
    disabled.enabled = false;
    fitpass_catalog::promotion::PromotionRepository::upsert_promotion(&h.store, &disabled)
        .await
        .unwrap();

    let booking = h
        .store
        .get_booking(receipt.booking_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(booking.total_minor, 4500);
    assert_eq!(booking.unit_price_minor, 2250);
}

#[tokio::test]
async fn test_promotion_at_usage_limit_is_rejected() {
    let h = harness();
    let unit = seed_unit(&h.store, 10, 2500).await;
    let mut promotion = seed_percentage_promotion(&h.store, 20, None, Some(3)).await;
    promotion.current_uses = 3;
    fitpass_catalog::promotion::PromotionRepository::upsert_promotion(&h.store, &promotion)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .execute(purchase(unit.id, 1, Some(promotion.id)))
        .await
        .unwrap_err();

    match err {
        PurchaseError::Admission(admission) => {
            assert_eq!(admission.reason_code(), "PROMOTION_INVALID")
        }
        other => panic!("expected admission error, got {:?}", other),
    }
    assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn test_admission_errors_carry_reason_codes() {
    let h = harness();
    let unit = seed_unit(&h.store, 3, 2500).await;

    let err = h
        .orchestrator
        .execute(purchase(unit.id, 9, None))
        .await
        .unwrap_err();
    match err {
        PurchaseError::Admission(AdmissionError::LimitExceeded { requested, max }) => {
            assert_eq!(requested, 9);
            assert_eq!(max, 5);
        }
        other => panic!("expected limit error, got {:?}", other),
    }

    let err = h
        .orchestrator
        .execute(purchase(Uuid::new_v4(), 1, None))
        .await
        .unwrap_err();
    match err {
        PurchaseError::Admission(admission) => {
            assert_eq!(admission.reason_code(), "UNIT_UNAVAILABLE")
        }
        other => panic!("expected admission error, got {:?}", other),
    }
}

/// Booking insert rejection must roll the order back too: a subsequent
/// read finds neither the order nor any conversion from the attempt.
#[tokio::test]
async fn test_rollback_on_booking_failure_leaves_no_partial_state() {
    let h = harness();
    // Rebuild the orchestrator against a booking repo that always rejects.
    let ledger = h.ledger.clone();
    let orchestrator = fitpass_order::PurchaseOrchestrator::new(
        Arc::new(h.store.clone()),
        Arc::new(h.store.clone()),
        Arc::new(h.store.clone()),
        Arc::new(RejectingBookings {
            inner: h.store.clone(),
        }),
        Arc::new(h.store.clone()),
        Arc::new(fitpass_order::SandboxPaymentGateway),
        ledger,
    );

    let unit = seed_unit(&h.store, 10, 2500).await;
    let err = orchestrator
        .execute(purchase(unit.id, 1, None))
        .await
        .unwrap_err();

    match err {
        PurchaseError::Saga { step, .. } => assert_eq!(step, "create booking"),
        other => panic!("expected saga error, got {:?}", other),
    }
    assert_eq!(h.store.order_count(), 0);
    assert_eq!(h.store.booking_count(), 0);
    assert_eq!(h.store.conversion_count(), 0);
}

#[tokio::test]
async fn test_rollback_on_gateway_failure_deletes_order_booking_and_conversion() {
    let h = harness_with_gateway(Arc::new(RejectingGateway));
    let unit = seed_unit(&h.store, 10, 2500).await;

    let referrer = Uuid::new_v4();
    let buyer = Uuid::new_v4();
    h.store.link_referral(referrer, buyer).await.unwrap();

    let err = h
        .orchestrator
        .execute(PurchaseRequest {
            unit_id: unit.id,
            quantity: 1,
            purchaser_id: buyer,
            promotion_id: None,
            pay_now: true,
        })
        .await
        .unwrap_err();

    match err {
        PurchaseError::Saga { step, .. } => assert_eq!(step, "authorize payment"),
        other => panic!("expected saga error, got {:?}", other),
    }
    assert_eq!(h.store.order_count(), 0);
    assert_eq!(h.store.booking_count(), 0);
    assert_eq!(h.store.conversion_count(), 0);
}

#[tokio::test]
async fn test_pay_later_skips_authorization() {
    let h = harness();
    let unit = seed_unit(&h.store, 10, 2500).await;

    let receipt = h
        .orchestrator
        .execute(PurchaseRequest {
            unit_id: unit.id,
            quantity: 1,
            purchaser_id: Uuid::new_v4(),
            promotion_id: None,
            pay_now: false,
        })
        .await
        .unwrap();

    assert!(receipt.payment_client_secret.is_none());
    assert!(h
        .store
        .get_for_order(receipt.order_id)
        .await
        .unwrap()
        .is_none());

    let order = h
        .store
        .get_order(receipt.order_id)
        .await
        .unwrap()
        .unwrap();
    assert!(order.payment_ref.is_none());
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_referred_buyer_gets_pending_commission() {
    let h = harness();
    let unit = seed_unit(&h.store, 10, 2500).await;

    let referrer = Uuid::new_v4();
    let buyer = Uuid::new_v4();
    h.store.link_referral(referrer, buyer).await.unwrap();

    let receipt = h
        .orchestrator
        .execute(PurchaseRequest {
            unit_id: unit.id,
            quantity: 2,
            purchaser_id: buyer,
            promotion_id: None,
            pay_now: true,
        })
        .await
        .unwrap();

    let conversion = fitpass_affiliate::repository::ConversionRepository::find_by_reference(
        &h.store,
        receipt.booking_id,
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(conversion.status, ConversionStatus::Pending);
    assert_eq!(conversion.referring_user_id, referrer);
    assert_eq!(conversion.conversion_value_minor, 5000);
    assert_eq!(conversion.commission_amount_minor, 250); // 5% default rate
    assert!(conversion.confirmed_at.is_none());
}

struct RejectingBookings {
    inner: fitpass_store::MemoryStore,
}

#[async_trait]
impl BookingRepository for RejectingBookings {
    async fn insert_booking(
        &self,
        _booking: &fitpass_order::models::Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("simulated booking store outage".into())
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<fitpass_order::models::Booking>, Box<dyn std::error::Error + Send + Sync>>
    {
        self.inner.get_booking(id).await
    }

    async fn get_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<fitpass_order::models::Booking>, Box<dyn std::error::Error + Send + Sync>>
    {
        self.inner.get_by_order(order_id).await
    }

    async fn delete_booking(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.delete_booking(id).await
    }

    async fn set_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.set_booking_status(id, status).await
    }

    async fn reference_exists(
        &self,
        reference: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.reference_exists(reference).await
    }
}

struct RejectingGateway;

#[async_trait]
impl PaymentGateway for RejectingGateway {
    async fn authorize(
        &self,
        _order_id: Uuid,
        _amount_minor: MinorUnits,
        _currency: &str,
        _idempotency_key: &str,
    ) -> Result<GatewayAuthorization, Box<dyn std::error::Error + Send + Sync>> {
        Err("simulated gateway outage".into())
    }

    async fn refund(
        &self,
        _external_ref: &str,
        _amount_minor: MinorUnits,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
