use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    entities::subscriptions::{SubscriptionEntity, UpsertSubscriptionEntity},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        commission::rate_for,
        enums::{plan_tiers::PlanTier, subscription_statuses::SubscriptionStatus},
    },
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: String,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = subscriptions::table
            .filter(subscriptions::stripe_subscription_id.eq(stripe_subscription_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn upsert_customer_ref(&self, user_id: Uuid, stripe_customer_id: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let free_row = UpsertSubscriptionEntity {
            user_id,
            plan: PlanTier::Free.to_string(),
            status: SubscriptionStatus::Active.to_string(),
            commission_rate_bps: rate_for(PlanTier::Free).bps(),
            stripe_customer_id: Some(stripe_customer_id.clone()),
            stripe_subscription_id: None,
            current_period_start: None,
            current_period_end: None,
        };

        insert_into(subscriptions::table)
            .values(&free_row)
            .on_conflict(subscriptions::user_id)
            .do_update()
            .set((
                subscriptions::stripe_customer_id.eq(Some(stripe_customer_id)),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn upsert_after_checkout(
        &self,
        subscription: UpsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let stored = insert_into(subscriptions::table)
            .values(&subscription)
            .on_conflict(subscriptions::user_id)
            .do_update()
            .set((&subscription, subscriptions::updated_at.eq(Utc::now())))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(stored)
    }

    async fn update_status_and_period_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: String,
        status: SubscriptionStatus,
        current_period_start: Option<DateTime<Utc>>,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let target = subscriptions::table
            .filter(subscriptions::stripe_subscription_id.eq(stripe_subscription_id));

        match (current_period_start, current_period_end) {
            (Some(starts_at), Some(ends_at)) => {
                update(target)
                    .set((
                        subscriptions::status.eq(status.to_string()),
                        subscriptions::current_period_start.eq(Some(starts_at)),
                        subscriptions::current_period_end.eq(Some(ends_at)),
                        subscriptions::updated_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)?;
            }
            _ => {
                update(target)
                    .set((
                        subscriptions::status.eq(status.to_string()),
                        subscriptions::updated_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)?;
            }
        }

        Ok(())
    }

    async fn downgrade_to_free_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: String,
        commission_rate_bps: i32,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(subscriptions::table)
            .filter(subscriptions::stripe_subscription_id.eq(stripe_subscription_id))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Cancelled.to_string()),
                subscriptions::plan.eq(PlanTier::Free.to_string()),
                subscriptions::commission_rate_bps.eq(commission_rate_bps),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }
}
