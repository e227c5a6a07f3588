use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Order, OrderStatus};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>>;

    /// Compensating delete for saga rollback.
    async fn delete_order(&self, id: Uuid)
        -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn set_payment_ref(
        &self,
        id: Uuid,
        payment_ref: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Orders own their booking 1:1.
    async fn get_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Compensating delete for saga rollback. Frees the booking reference.
    async fn delete_booking(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn set_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Collision check for reference generation.
    async fn reference_exists(
        &self,
        reference: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
