use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payouts::{InsertPayoutEntity, PayoutEntity};

#[automock]
#[async_trait]
pub trait PayoutRepository {
    /// Returns None when the booking already has a payout.
    async fn insert_if_absent(
        &self,
        insert_payout_entity: InsertPayoutEntity,
    ) -> Result<Option<PayoutEntity>>;

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<PayoutEntity>>;
}
