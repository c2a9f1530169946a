use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::services::ServiceEntity;

#[automock]
#[async_trait]
pub trait ServiceRepository {
    async fn find_active_by_id(&self, service_id: Uuid) -> Result<Option<ServiceEntity>>;
}
