use std::sync::Arc;

use fitpass_affiliate::CommissionLedger;
use fitpass_catalog::promotion::PromotionRepository;
use fitpass_catalog::unit::UnitRepository;
use fitpass_core::payment::{
    PaymentAuthorization, PaymentGateway, PaymentRepository, PaymentStatus, RefundRequest,
    SettlementClaim, SettlementOutcome,
};
use fitpass_shared::money::MinorUnits;

use crate::models::{Booking, BookingStatus, OrderStatus};
use crate::repository::{BookingRepository, OrderRepository};

/// Idempotent handler for the gateway's asynchronous settlement callback.
///
/// Deliveries can arrive zero, one, or many times and concurrently; all of
/// them serialize through the compare-and-set on the authorization status,
/// so at most one caller per external_ref finalizes. Capacity is debited
/// here, not at purchase time, through the repository's atomic conditional
/// update.
pub struct SettlementReconciler {
    units: Arc<dyn UnitRepository>,
    promotions: Arc<dyn PromotionRepository>,
    orders: Arc<dyn OrderRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<CommissionLedger>,
}

impl SettlementReconciler {
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

    pub async fn on_callback(
        &self,
        external_ref: &str,
        outcome: SettlementOutcome,
        amount_minor: MinorUnits,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let auth = match self.payments.get_by_external_ref(external_ref).await? {
            Some(auth) => auth,
            None => {
                tracing::warn!(%external_ref, "settlement callback for unknown authorization");
                return Ok(());
            }
        };

        if amount_minor != auth.amount_minor {
            tracing::warn!(
                %external_ref,
                authorized = auth.amount_minor,
                reported = amount_minor,
                "settlement amount differs from authorization"
            );
        }

        let target = match outcome {
            SettlementOutcome::Succeeded => PaymentStatus::Succeeded,
            SettlementOutcome::Failed => PaymentStatus::Failed,
        };
        match self.payments.transition_if_pending(external_ref, target).await? {
            SettlementClaim::AlreadySettled(status) => {
                tracing::debug!(%external_ref, ?status, "duplicate settlement callback ignored");
                return Ok(());
            }
            SettlementClaim::Claimed => {}
        }

        let booking = match self.bookings.get_by_order(auth.order_id).await? {
            Some(booking) => booking,
            None => {
                tracing::error!(order_id = %auth.order_id, "settled authorization has no booking");
                return Ok(());
            }
        };

        match outcome {
            SettlementOutcome::Succeeded => self.finalize_success(&auth, &booking).await,
            SettlementOutcome::Failed => self.finalize_failure(&auth, &booking).await,
        }
    }

    async fn finalize_success(
        &self,
        auth: &PaymentAuthorization,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let debited = self
            .units
            .try_consume_capacity(booking.unit_id, booking.quantity)
            .await?;
        if !debited {
            return self.resolve_oversell(auth, booking).await;
        }

        self.bookings
            .set_booking_status(booking.id, BookingStatus::Confirmed)
            .await?;
        self.orders
            .set_order_status(auth.order_id, OrderStatus::Confirmed)
            .await?;

        if let Some(promotion_id) = booking.promotion_id {
            if !self.promotions.try_increment_uses(promotion_id).await? {
                // Prices were frozen at purchase; an exhausted counter only
                // blocks future redemptions.
                tracing::warn!(%promotion_id, "promotion usage cap reached at settlement");
            }
        }

        self.ledger
            .settle_booking(booking.id, SettlementOutcome::Succeeded)
            .await?;

        tracing::info!(
            order_id = %auth.order_id,
            booking = %booking.reference,
            "settlement confirmed"
        );
        Ok(())
    }

    /// The advisory hold let more settlements through than capacity
    /// allows. The losing booking is cancelled and refunded; a confirmed
    /// booking is never kept against oversold inventory.
    async fn resolve_oversell(
        &self,
        auth: &PaymentAuthorization,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::warn!(
            order_id = %auth.order_id,
            unit_id = %booking.unit_id,
            "capacity exhausted at settlement, cancelling and refunding"
        );

        self.payments.mark_failed(&auth.external_ref).await?;
        self.bookings
            .set_booking_status(booking.id, BookingStatus::Cancelled)
            .await?;
        self.orders
            .set_order_status(auth.order_id, OrderStatus::Cancelled)
            .await?;

        // Record before calling out: a gateway failure must not lose the
        // refund obligation.
        let refund = RefundRequest::new(auth.order_id, auth.external_ref.clone(), auth.amount_minor);
        self.payments.record_refund(&refund).await?;
        if let Err(e) = self.gateway.refund(&auth.external_ref, auth.amount_minor).await {
            tracing::error!(error = %e, order_id = %auth.order_id, "refund request failed");
        }

        self.ledger
            .settle_booking(booking.id, SettlementOutcome::Failed)
            .await?;
        Ok(())
    }

    async fn finalize_failure(
        &self,
        auth: &PaymentAuthorization,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Inventory was never debited for this order, so nothing to release.
        self.bookings
            .set_booking_status(booking.id, BookingStatus::Cancelled)
            .await?;
        self.orders
            .set_order_status(auth.order_id, OrderStatus::Cancelled)
            .await?;
        self.ledger
            .settle_booking(booking.id, SettlementOutcome::Failed)
            .await?;

        tracing::info!(order_id = %auth.order_id, "settlement failed, booking cancelled");
        Ok(())
    }
}
