use std::net::SocketAddr;
use std::sync::Arc;

use fitpass_affiliate::{CommissionLedger, CommissionRates};
use fitpass_api::{app, AppState};
use fitpass_order::{
    AuthorizationReaper, PurchaseOrchestrator, SandboxPaymentGateway, SettlementReconciler,
};
use fitpass_store::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitpass_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fitpass_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting FitPass API on port {}", config.server.port);

    let store = MemoryStore::new();
    let gateway = Arc::new(SandboxPaymentGateway);

    let ledger = Arc::new(CommissionLedger::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        CommissionRates {
            booking_rate_bps: config.business_rules.booking_commission_rate_bps,
            signup_flat_minor: config.business_rules.signup_commission_minor,
        },
    ));

    let orchestrator = Arc::new(PurchaseOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        gateway.clone(),
        ledger.clone(),
    ));

    let reconciler = Arc::new(SettlementReconciler::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        gateway.clone(),
        ledger.clone(),
    ));

    let reaper = Arc::new(AuthorizationReaper::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        ledger.clone(),
        config.business_rules.settlement_horizon_seconds,
    ));
    tokio::spawn(fitpass_api::worker::start_reaper_worker(
        reaper,
        config.business_rules.reaper_interval_seconds,
    ));

    let app_state = AppState {
        orchestrator,
        reconciler,
        units: Arc::new(store.clone()),
        promotions: Arc::new(store.clone()),
        orders: Arc::new(store.clone()),
        bookings: Arc::new(store.clone()),
        payments: Arc::new(store.clone()),
        referrals: Arc::new(store.clone()),
        ledger: ledger.clone(),
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
