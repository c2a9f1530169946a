use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::processed_webhook_events},
};
use domain::{
    entities::processed_webhook_events::{
        EVENT_STATUS_PROCESSING, EVENT_STATUS_SUCCEEDED, InsertProcessedWebhookEventEntity,
    },
    repositories::processed_webhook_events::ProcessedWebhookEventRepository,
};

pub struct ProcessedWebhookEventPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProcessedWebhookEventPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProcessedWebhookEventRepository for ProcessedWebhookEventPostgres {
    async fn claim(
        &self,
        event_id: String,
        event_type: String,
        stale_before: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(processed_webhook_events::table)
            .values(&InsertProcessedWebhookEventEntity {
                event_id: event_id.clone(),
                event_type,
                status: EVENT_STATUS_PROCESSING.to_string(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)?;

        if inserted == 1 {
            return Ok(true);
        }

        // A worker that died mid-event leaves a `processing` row behind; take it over once stale.
        let reclaimed = update(processed_webhook_events::table)
            .filter(processed_webhook_events::event_id.eq(event_id))
            .filter(processed_webhook_events::status.eq(EVENT_STATUS_PROCESSING))
            .filter(processed_webhook_events::started_at.lt(stale_before))
            .set(processed_webhook_events::started_at.eq(Utc::now()))
            .execute(&mut conn)?;

        Ok(reclaimed == 1)
    }

    async fn mark_succeeded(&self, event_id: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(processed_webhook_events::table)
            .filter(processed_webhook_events::event_id.eq(event_id))
            .set((
                processed_webhook_events::status.eq(EVENT_STATUS_SUCCEEDED),
                processed_webhook_events::completed_at.eq(Some(Utc::now())),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn release(&self, event_id: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(processed_webhook_events::table)
            .filter(processed_webhook_events::event_id.eq(event_id))
            .filter(processed_webhook_events::status.eq(EVENT_STATUS_PROCESSING))
            .execute(&mut conn)?;

        Ok(())
    }
}
