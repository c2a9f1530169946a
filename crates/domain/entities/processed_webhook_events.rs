use diesel::prelude::*;

use crate::infra::db::postgres::schema::processed_webhook_events;

pub const EVENT_STATUS_PROCESSING: &str = "processing";
pub const EVENT_STATUS_SUCCEEDED: &str = "succeeded";

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = processed_webhook_events)]
pub struct InsertProcessedWebhookEventEntity {
    pub event_id: String,
    pub event_type: String,
    pub status: String,
}
