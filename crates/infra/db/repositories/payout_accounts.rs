use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payout_accounts},
};
use domain::{
    entities::payout_accounts::PayoutAccountEntity,
    repositories::payout_accounts::PayoutAccountRepository,
};

pub struct PayoutAccountPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PayoutAccountPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PayoutAccountRepository for PayoutAccountPostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<PayoutAccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let account = payout_accounts::table
            .filter(payout_accounts::user_id.eq(user_id))
            .select(PayoutAccountEntity::as_select())
            .first::<PayoutAccountEntity>(&mut conn)
            .optional()?;

        Ok(account)
    }

    async fn update_capabilities(
        &self,
        stripe_account_id: String,
        charges_enabled: bool,
        payouts_enabled: bool,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(payout_accounts::table)
            .filter(payout_accounts::stripe_account_id.eq(stripe_account_id))
            .set((
                payout_accounts::charges_enabled.eq(charges_enabled),
                payout_accounts::payouts_enabled.eq(payouts_enabled),
                payout_accounts::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }
}
