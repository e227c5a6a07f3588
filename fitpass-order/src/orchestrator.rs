use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fitpass_affiliate::CommissionLedger;
use fitpass_catalog::inventory::{AdmissionError, InventoryGuard};
use fitpass_catalog::promotion::{DiscountResult, Promotion, PromotionEngine, PromotionRepository};
use fitpass_catalog::unit::{SellableUnit, UnitRepository};
use fitpass_core::payment::{
    GatewayAuthorization, PaymentAuthorization, PaymentGateway, PaymentRepository,
};
use fitpass_shared::money::MinorUnits;
use fitpass_shared::reference;
use uuid::Uuid;

use crate::models::{Booking, LineItem, Order};
use crate::repository::{BookingRepository, OrderRepository};

const MAX_REFERENCE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub unit_id: Uuid,
    pub quantity: i32,
    pub purchaser_id: Uuid,
    pub promotion_id: Option<Uuid>,
    /// false selects the pay-later path: no authorization is opened and
    /// the order/booking stay pending until paid through another channel.
    pub pay_now: bool,
}

#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub order_id: Uuid,
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub total_minor: MinorUnits,
    pub payment_client_secret: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    /// Rejected before any write. Nothing to compensate.
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// A pipeline step failed after writes had been committed; all of them
    /// were compensated before this surfaced.
    #[error("purchase pipeline failed at '{step}': {source}")]
    Saga {
        step: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Undo action for a committed saga step, executed in reverse on failure.
enum Compensation {
    DeleteOrder(Uuid),
    DeleteBooking(Uuid),
    DeleteConversion(Uuid),
}

/// Sequences Order -> Booking -> AffiliateConversion -> payment
/// authorization. Every committed step registers an undo; any later
/// failure rolls the whole attempt back before the error is returned, so
/// no partial state is visible to subsequent reads.
pub struct PurchaseOrchestrator {
    units: Arc<dyn UnitRepository>,
    promotions: Arc<dyn PromotionRepository>,
    orders: Arc<dyn OrderRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<CommissionLedger>,
}

impl PurchaseOrchestrator {
    pub fn new(
        units: Arc<dyn UnitRepository>,
        promotions: Arc<dyn PromotionRepository>,
        orders: Arc<dyn OrderRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<CommissionLedger>,
    ) -> Self {
        Self {
            units,
            promotions,
            orders,
            bookings,
            payments,
            gateway,
            ledger,
        }
    }

    pub async fn execute(&self, req: PurchaseRequest) -> Result<PurchaseReceipt, PurchaseError> {
        let now = Utc::now();

        // Admission: advisory only. The capacity condition is re-checked
        // atomically at settlement.
        let unit = self
            .units
            .get_unit(req.unit_id)
            .await
            .map_err(|e| step_error("load unit", e))?
            .ok_or(AdmissionError::UnitUnavailable(req.unit_id))?;
        let _hold = InventoryGuard::check_and_hold(&unit, req.quantity, req.purchaser_id, now)?;

        let candidates = self.load_candidates(&req).await?;
        let gross = unit.price_minor * req.quantity as i64;
        let quote = PromotionEngine::resolve(gross, unit.id, &candidates, now);
        if !quote.valid {
            let reason = quote.reason.unwrap_or_else(|| "promotion rejected".to_string());
            return Err(AdmissionError::PromotionInvalid(reason).into());
        }

        let mut undo: Vec<Compensation> = Vec::new();
        match self.attempt(&req, &unit, &quote, &mut undo).await {
            Ok(receipt) => {
                tracing::info!(
                    order_id = %receipt.order_id,
                    booking = %receipt.booking_reference,
                    total_minor = receipt.total_minor,
                    pay_now = req.pay_now,
                    "purchase pipeline completed"
                );
                Ok(receipt)
            }
            Err((step, source)) => {
                tracing::warn!(step, error = %source, "purchase step failed, rolling back");
                self.rollback(undo).await;
                Err(PurchaseError::Saga { step, source })
            }
        }
    }

    async fn load_candidates(
        &self,
        req: &PurchaseRequest,
    ) -> Result<Vec<Promotion>, PurchaseError> {
        match req.promotion_id {
            None => Ok(Vec::new()),
            Some(promotion_id) => {
                let promotion = self
                    .promotions
                    .get_promotion(promotion_id)
                    .await
                    .map_err(|e| step_error("load promotion", e))?
                    .ok_or_else(|| {
                        AdmissionError::PromotionInvalid("unknown promotion".to_string())
                    })?;
                Ok(vec![promotion])
            }
        }
    }

    async fn attempt(
        &self,
        req: &PurchaseRequest,
        unit: &SellableUnit,
        quote: &DiscountResult,
        undo: &mut Vec<Compensation>,
    ) -> Result<PurchaseReceipt, (&'static str, Box<dyn std::error::Error + Send + Sync>)> {
        // 1. Order, pending. The line item carries post-discount prices.
        let unit_price = quote.final_minor / req.quantity as i64;
        let mut order = Order::new(req.purchaser_id, unit.currency.clone());
        order.add_item(LineItem {
            unit_id: unit.id,
            description: unit.name.clone(),
            quantity: req.quantity,
            unit_price_minor: unit_price,
            total_minor: quote.final_minor,
        });
        self.orders
            .insert_order(&order)
            .await
            .map_err(|e| ("create order", e))?;
        undo.push(Compensation::DeleteOrder(order.id));

        // 2. Booking with a collision-checked unique reference and prices
        // frozen from the quote.
        let booking_reference = self
            .unique_reference()
            .await
            .map_err(|e| ("generate booking reference", e))?;
        let booking = Booking::new(
            order.id,
            unit.id,
            req.quantity,
            unit_price,
            quote.final_minor,
            booking_reference.clone(),
            quote.promotion_id,
        );
        self.bookings
            .insert_booking(&booking)
            .await
            .map_err(|e| ("create booking", e))?;
        undo.push(Compensation::DeleteBooking(booking.id));

        // 3. Pending commission, only for referred buyers.
        if let Some(conversion) = self
            .ledger
            .record_booking_pending(req.purchaser_id, booking.id, quote.final_minor)
            .await
            .map_err(|e| ("record commission", e))?
        {
            undo.push(Compensation::DeleteConversion(conversion.id));
        }

        // 4. Payment authorization, keyed by order id so a retried request
        // cannot double-charge. The gateway call itself needs no undo: a
        // never-confirmed authorization simply expires.
        let mut payment_client_secret = None;
        if req.pay_now {
            let grant = self
                .gateway
                .authorize(
                    order.id,
                    quote.final_minor,
                    &unit.currency,
                    &order.id.to_string(),
                )
                .await
                .map_err(|e| ("authorize payment", e))?;
            let auth = PaymentAuthorization::new(
                order.id,
                quote.final_minor,
                unit.currency.clone(),
                grant.external_ref.clone(),
                grant.client_secret.clone(),
            );
            self.payments
                .insert_authorization(&auth)
                .await
                .map_err(|e| ("record authorization", e))?;
            self.orders
                .set_payment_ref(order.id, &grant.external_ref)
                .await
                .map_err(|e| ("record authorization", e))?;
            payment_client_secret = grant.client_secret;
        }

        Ok(PurchaseReceipt {
            order_id: order.id,
            booking_id: booking.id,
            booking_reference,
            total_minor: quote.final_minor,
            payment_client_secret,
        })
    }

    async fn unique_reference(
        &self,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        for _ in 0..MAX_REFERENCE_ATTEMPTS {
            let candidate = reference::generate();
            if !self.bookings.reference_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::warn!(reference = %candidate, "booking reference collision, regenerating");
        }
        Err("exhausted booking reference attempts".into())
    }

    /// Execute registered compensations in reverse order. A failed
    /// compensation is logged and the sweep continues; the remaining undo
    /// actions must still run.
    async fn rollback(&self, undo: Vec<Compensation>) {
        for compensation in undo.into_iter().rev() {
            let result = match &compensation {
                Compensation::DeleteOrder(id) => self.orders.delete_order(*id).await,
                Compensation::DeleteBooking(id) => self.bookings.delete_booking(*id).await,
                Compensation::DeleteConversion(id) => {
                    self.ledger_delete(*id).await
                }
            };
            if let Err(e) = result {
                tracing::error!(error = %e, "compensation failed during rollback");
            }
        }
    }

    async fn ledger_delete(
        &self,
        conversion_id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.ledger.delete_pending(conversion_id).await
    }
}

fn step_error(
    step: &'static str,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> PurchaseError {
    PurchaseError::Saga { step, source }
}

/// Gateway stand-in for local runs and tests. Deterministic per
/// idempotency key, so retried authorizations land on the same ref.
pub struct SandboxPaymentGateway;

#[async_trait]
impl PaymentGateway for SandboxPaymentGateway {
    async fn authorize(
        &self,
        _order_id: Uuid,
        _amount_minor: MinorUnits,
        _currency: &str,
        idempotency_key: &str,
    ) -> Result<GatewayAuthorization, Box<dyn std::error::Error + Send + Sync>> {
        Ok(GatewayAuthorization {
            external_ref: format!("sbx_{}", idempotency_key),
            client_secret: Some(format!("sbx_secret_{}", idempotency_key)),
        })
    }

    async fn refund(
        &self,
        external_ref: &str,
        amount_minor: MinorUnits,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(%external_ref, amount_minor, "sandbox refund accepted");
        Ok(())
    }
}
