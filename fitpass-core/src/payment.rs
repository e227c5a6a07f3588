use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitpass_shared::money::MinorUnits;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Outcome reported by the gateway's asynchronous settlement callback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementOutcome {
    Succeeded,
    Failed,
}

/// One authorization per order; the idempotency key towards the gateway is
/// the order id, so resubmitting the same order never double-charges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount_minor: MinorUnits,
    pub currency: String,
    pub external_ref: String,
    pub client_secret: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentAuthorization {
    pub fn new(
        order_id: Uuid,
        amount_minor: MinorUnits,
        currency: String,
        external_ref: String,
        client_secret: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            amount_minor,
            currency,
            external_ref,
            client_secret,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Money scheduled back to the buyer, recorded before the gateway call so
/// a failed refund request is never lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: Uuid,
    pub order_id: Uuid,
    pub external_ref: String,
    pub amount_minor: MinorUnits,
    pub requested_at: DateTime<Utc>,
}

impl RefundRequest {
    pub fn new(order_id: Uuid, external_ref: String, amount_minor: MinorUnits) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            external_ref,
            amount_minor,
            requested_at: Utc::now(),
        }
    }
}

/// What the gateway hands back when an authorization is opened.
#[derive(Debug, Clone)]
pub struct GatewayAuthorization {
    pub external_ref: String,
    pub client_secret: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an authorization with the provider. Must be safe to retry with
    /// the same idempotency key without double-charging.
    async fn authorize(
        &self,
        order_id: Uuid,
        amount_minor: MinorUnits,
        currency: &str,
        idempotency_key: &str,
    ) -> Result<GatewayAuthorization, Box<dyn std::error::Error + Send + Sync>>;

    /// Send an authorized amount back. Used by oversell resolution.
    async fn refund(
        &self,
        external_ref: &str,
        amount_minor: MinorUnits,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Result of the settlement idempotency guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementClaim {
    /// This caller won the transition out of Pending and owns finalization.
    Claimed,
    /// A previous delivery already settled this authorization.
    AlreadySettled(PaymentStatus),
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_authorization(
        &self,
        auth: &PaymentAuthorization,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_by_external_ref(
        &self,
        external_ref: &str,
    ) -> Result<Option<PaymentAuthorization>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<PaymentAuthorization>, Box<dyn std::error::Error + Send + Sync>>;

    /// Compare-and-set: Pending -> `to`. At most one caller per external_ref
    /// ever sees `Claimed`; duplicate and concurrent settlement deliveries
    /// serialize through this.
    async fn transition_if_pending(
        &self,
        external_ref: &str,
        to: PaymentStatus,
    ) -> Result<SettlementClaim, Box<dyn std::error::Error + Send + Sync>>;

    /// Unconditional downgrade used by oversell resolution after a won claim.
    async fn mark_failed(
        &self,
        external_ref: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Pending authorizations created before `cutoff`, for the reaper.
    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PaymentAuthorization>, Box<dyn std::error::Error + Send + Sync>>;

    async fn record_refund(
        &self,
        refund: &RefundRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn list_refunds(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RefundRequest>, Box<dyn std::error::Error + Send + Sync>>;
}
