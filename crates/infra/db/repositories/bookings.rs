use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};
use domain::{
    entities::bookings::{BookingEntity, InsertBookingEntity},
    repositories::bookings::BookingRepository,
    value_objects::enums::booking_statuses::BookingStatus,
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn insert(&self, insert_booking_entity: InsertBookingEntity) -> Result<BookingEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking = insert_into(bookings::table)
            .values(&insert_booking_entity)
            .returning(BookingEntity::as_returning())
            .get_result::<BookingEntity>(&mut conn)?;

        Ok(booking)
    }

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking = bookings::table
            .filter(bookings::id.eq(booking_id))
            .select(BookingEntity::as_select())
            .first::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(booking)
    }

    async fn list_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = bookings::table
            .filter(bookings::buyer_id.eq(buyer_id))
            .order(bookings::starts_at.desc())
            .select(BookingEntity::as_select())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = bookings::table
            .filter(bookings::provider_id.eq(provider_id))
            .order(bookings::starts_at.desc())
            .select(BookingEntity::as_select())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn compare_and_set_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(bookings::table)
            .filter(bookings::id.eq(booking_id))
            .filter(bookings::status.eq(from.as_str()))
            .set((
                bookings::status.eq(to.as_str()),
                bookings::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(updated == 1)
    }

    async fn confirm_with_payment(&self, booking_id: Uuid, payment_ref: String) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(bookings::table)
            .filter(bookings::id.eq(booking_id))
            .filter(bookings::status.eq_any([
                BookingStatus::Pending.as_str(),
                BookingStatus::Confirmed.as_str(),
            ]))
            .filter(bookings::payment_ref.is_null())
            .set((
                bookings::status.eq(BookingStatus::Confirmed.as_str()),
                bookings::payment_ref.eq(Some(payment_ref)),
                bookings::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(updated == 1)
    }
}
