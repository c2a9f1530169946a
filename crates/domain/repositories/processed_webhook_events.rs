use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

#[automock]
#[async_trait]
pub trait ProcessedWebhookEventRepository {
    /// Claims exclusive processing of `event_id`. A claim still `processing` and started
    /// before `stale_before` is taken over. Returns false when the event is already
    /// processed or being processed.
    async fn claim(
        &self,
        event_id: String,
        event_type: String,
        stale_before: DateTime<Utc>,
    ) -> Result<bool>;

    async fn mark_succeeded(&self, event_id: String) -> Result<()>;

    /// Drops a claim after a failed attempt so the redelivery is processed again.
    async fn release(&self, event_id: String) -> Result<()>;
}
