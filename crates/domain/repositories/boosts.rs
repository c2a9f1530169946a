use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::boosts::{BoostEntity, InsertBoostEntity};

#[automock]
#[async_trait]
pub trait BoostRepository {
    /// Returns None when a boost for the same payment reference already exists.
    async fn insert_if_absent(&self, insert_boost_entity: InsertBoostEntity)
    -> Result<Option<BoostEntity>>;

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BoostEntity>>;
}
