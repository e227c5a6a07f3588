pub mod models;
pub mod orchestrator;
pub mod reaper;
pub mod repository;
pub mod settlement;

pub use models::{Booking, BookingStatus, LineItem, Order, OrderStatus};
pub use orchestrator::{
    PurchaseError, PurchaseOrchestrator, PurchaseReceipt, PurchaseRequest, SandboxPaymentGateway,
};
pub use reaper::AuthorizationReaper;
pub use repository::{BookingRepository, OrderRepository};
pub use settlement::SettlementReconciler;
