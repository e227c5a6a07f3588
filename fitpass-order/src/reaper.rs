use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fitpass_affiliate::CommissionLedger;
use fitpass_core::payment::{
    PaymentRepository, PaymentStatus, SettlementClaim, SettlementOutcome,
};

use crate::models::{BookingStatus, OrderStatus};
use crate::repository::{BookingRepository, OrderRepository};

/// Expires authorizations whose settlement callback never arrived within
/// the configured horizon. This is a timeout-driven compensating
/// transition, not a caller-driven cancellation: the advisory hold is
/// released simply because capacity was never debited.
pub struct AuthorizationReaper {
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
    bookings: Arc<dyn BookingRepository>,
    ledger: Arc<CommissionLedger>,
    horizon: Duration,
}

impl AuthorizationReaper {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        orders: Arc<dyn OrderRepository>,
        bookings: Arc<dyn BookingRepository>,
        ledger: Arc<CommissionLedger>,
        horizon_seconds: i64,
    ) -> Self {
        Self {
            payments,
            orders,
            bookings,
            ledger,
            horizon: Duration::seconds(horizon_seconds),
        }
    }

    /// One sweep. Returns how many authorizations were expired.
    pub async fn run_once(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let cutoff = now - self.horizon;
        let stale = self.payments.list_pending_older_than(cutoff).await?;
        let mut reaped = 0;

        for auth in stale {
            // Same guard as the callback path; a callback landing mid-sweep
            // wins and the reaper backs off.
            match self
                .payments
                .transition_if_pending(&auth.external_ref, PaymentStatus::Failed)
                .await?
            {
                SettlementClaim::AlreadySettled(_) => continue,
                SettlementClaim::Claimed => {}
            }

            if let Some(booking) = self.bookings.get_by_order(auth.order_id).await? {
                self.bookings
                    .set_booking_status(booking.id, BookingStatus::Cancelled)
                    .await?;
                self.ledger
                    .settle_booking(booking.id, SettlementOutcome::Failed)
                    .await?;
            }
            self.orders
                .set_order_status(auth.order_id, OrderStatus::Cancelled)
                .await?;

            tracing::info!(
                order_id = %auth.order_id,
                external_ref = %auth.external_ref,
                "expired pending authorization"
            );
            reaped += 1;
        }

        Ok(reaped)
    }
}
