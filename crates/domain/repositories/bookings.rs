use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::bookings::{BookingEntity, InsertBookingEntity};
use crate::domain::value_objects::enums::booking_statuses::BookingStatus;

#[automock]
#[async_trait]
pub trait BookingRepository {
    async fn insert(&self, insert_booking_entity: InsertBookingEntity) -> Result<BookingEntity>;

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    async fn list_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<BookingEntity>>;

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<BookingEntity>>;

    /// Writes `to` only while the stored status still equals `from`.
    /// Returns false when another writer got there first.
    async fn compare_and_set_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool>;

    /// Attaches `payment_ref` to a PENDING or CONFIRMED booking that has none yet and leaves it
    /// CONFIRMED. Returns false when the booking is no longer in that state.
    async fn confirm_with_payment(&self, booking_id: Uuid, payment_ref: String) -> Result<bool>;
}
