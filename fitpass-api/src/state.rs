use std::sync::Arc;

use fitpass_affiliate::repository::ReferralRepository;
use fitpass_affiliate::CommissionLedger;
use fitpass_catalog::promotion::PromotionRepository;
use fitpass_catalog::unit::UnitRepository;
use fitpass_core::payment::PaymentRepository;
use fitpass_order::repository::{BookingRepository, OrderRepository};
use fitpass_order::{PurchaseOrchestrator, SettlementReconciler};
use fitpass_store::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PurchaseOrchestrator>,
    pub reconciler: Arc<SettlementReconciler>,
    pub units: Arc<dyn UnitRepository>,
    pub promotions: Arc<dyn PromotionRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub referrals: Arc<dyn ReferralRepository>,
    pub ledger: Arc<CommissionLedger>,
    pub business_rules: BusinessRules,
}
