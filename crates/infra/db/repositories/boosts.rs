use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::boosts},
};
use domain::{
    entities::boosts::{BoostEntity, InsertBoostEntity},
    repositories::boosts::BoostRepository,
};

pub struct BoostPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BoostPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BoostRepository for BoostPostgres {
    async fn insert_if_absent(
        &self,
        insert_boost_entity: InsertBoostEntity,
    ) -> Result<Option<BoostEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let boost = insert_into(boosts::table)
            .values(&insert_boost_entity)
            .on_conflict(boosts::payment_ref)
            .do_nothing()
            .returning(BoostEntity::as_returning())
            .get_result::<BoostEntity>(&mut conn)
            .optional()?;

        Ok(boost)
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BoostEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let boost = boosts::table
            .filter(boosts::user_id.eq(user_id))
            .filter(boosts::expires_at.ge(now))
            .order(boosts::expires_at.desc())
            .select(BoostEntity::as_select())
            .first::<BoostEntity>(&mut conn)
            .optional()?;

        Ok(boost)
    }
}
