pub mod payment;

pub use payment::{
    GatewayAuthorization, PaymentAuthorization, PaymentGateway, PaymentRepository, PaymentStatus,
    RefundRequest, SettlementClaim, SettlementOutcome,
};
