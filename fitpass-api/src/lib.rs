use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod error;
pub mod orders;
pub mod purchases;
pub mod state;
pub mod webhooks;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/v1/purchases", post(purchases::create_purchase))
        .route("/v1/webhooks/payments", post(webhooks::handle_settlement_callback))
        .route("/v1/orders/{id}", get(orders::get_order))
        .route("/v1/bookings/{id}", get(orders::get_booking))
        .route("/v1/admin/units", post(admin::create_unit))
        .route("/v1/admin/promotions", post(admin::create_promotion))
        .route("/v1/admin/referrals", post(admin::link_referral))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
