#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use fitpass_affiliate::{CommissionLedger, CommissionRates};
use fitpass_catalog::promotion::{DiscountType, Promotion, PromotionRepository};
use fitpass_catalog::unit::{SellableUnit, UnitKind, UnitRepository};
use fitpass_core::payment::PaymentGateway;
use fitpass_order::{
    AuthorizationReaper, PurchaseOrchestrator, SandboxPaymentGateway, SettlementReconciler,
};
use fitpass_shared::money::MinorUnits;
use fitpass_shared::TimeWindow;
use fitpass_store::MemoryStore;
use uuid::Uuid;

pub struct Harness {
    pub store: MemoryStore,
    pub orchestrator: PurchaseOrchestrator,
    pub reconciler: SettlementReconciler,
    pub reaper: AuthorizationReaper,
    pub ledger: Arc<CommissionLedger>,
}

pub fn harness() -> Harness {
    harness_with_gateway(Arc::new(SandboxPaymentGateway))
}

pub fn harness_with_gateway(gateway: Arc<dyn PaymentGateway>) -> Harness {
    let store = MemoryStore::new();
    let ledger = Arc::new(CommissionLedger::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        CommissionRates::default(),
    ));

    let orchestrator = PurchaseOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        gateway.clone(),
        ledger.clone(),
    );

    let reconciler = SettlementReconciler::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        gateway,
        ledger.clone(),
    );

    let reaper = AuthorizationReaper::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        ledger.clone(),
        1800,
    );

    Harness {
        store,
        orchestrator,
        reconciler,
        reaper,
        ledger,
    }
}

pub async fn seed_unit(store: &MemoryStore, capacity: i32, price_minor: MinorUnits) -> SellableUnit {
    let now = Utc::now();
    let unit = SellableUnit {
        id: Uuid::new_v4(),
        name: "Riverside Gym 10-class pack".to_string(),
        kind: UnitKind::GymPackage,
        capacity_total: capacity,
        capacity_consumed: 0,
        price_minor,
        currency: "THB".to_string(),
        max_per_purchaser: 5,
        sale_window: TimeWindow::new(now - Duration::days(1), now + Duration::days(30)),
        active: true,
        created_at: now,
        updated_at: now,
    };
    store.upsert_unit(&unit).await.unwrap();
    unit
}

pub async fn seed_percentage_promotion(
    store: &MemoryStore,
    percent: i64,
    cap: Option<MinorUnits>,
    max_uses: Option<i32>,
) -> Promotion {
    let now = Utc::now();
    let promotion = Promotion {
        id: Uuid::new_v4(),
        code: "LAUNCH".to_string(),
        discount_type: DiscountType::Percentage,
        discount_value: percent,
        applicable_unit_id: None,
        min_purchase_minor: 0,
        max_discount_minor: cap,
        max_uses,
        current_uses: 0,
        active_window: TimeWindow::new(now - Duration::days(1), now + Duration::days(30)),
        enabled: true,
    };
    store.upsert_promotion(&promotion).await.unwrap();
    promotion
}
