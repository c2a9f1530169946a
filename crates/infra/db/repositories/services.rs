use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::services},
};
use domain::{entities::services::ServiceEntity, repositories::services::ServiceRepository};

pub struct ServicePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ServicePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ServiceRepository for ServicePostgres {
    async fn find_active_by_id(&self, service_id: Uuid) -> Result<Option<ServiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let service = services::table
            .filter(services::id.eq(service_id))
            .filter(services::is_active.eq(true))
            .select(ServiceEntity::as_select())
            .first::<ServiceEntity>(&mut conn)
            .optional()?;

        Ok(service)
    }
}
