use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payouts},
};
use domain::{
    entities::payouts::{InsertPayoutEntity, PayoutEntity},
    repositories::payouts::PayoutRepository,
};

pub struct PayoutPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PayoutPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PayoutRepository for PayoutPostgres {
    async fn insert_if_absent(
        &self,
        insert_payout_entity: InsertPayoutEntity,
    ) -> Result<Option<PayoutEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let payout = insert_into(payouts::table)
            .values(&insert_payout_entity)
            .on_conflict(payouts::booking_id)
            .do_nothing()
            .returning(PayoutEntity::as_returning())
            .get_result::<PayoutEntity>(&mut conn)
            .optional()?;

        Ok(payout)
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<PayoutEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = payouts::table
            .filter(payouts::provider_id.eq(provider_id))
            .order(payouts::scheduled_at.desc())
            .select(PayoutEntity::as_select())
            .load::<PayoutEntity>(&mut conn)?;

        Ok(results)
    }
}
