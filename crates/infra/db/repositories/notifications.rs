use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::notifications},
};
use domain::{
    entities::notifications::InsertNotificationEntity,
    repositories::notifications::NotificationRepository,
};

pub struct NotificationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl NotificationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NotificationRepository for NotificationPostgres {
    async fn insert(&self, insert_notification_entity: InsertNotificationEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let notification_id = insert_into(notifications::table)
            .values(&insert_notification_entity)
            .returning(notifications::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(notification_id)
    }
}
