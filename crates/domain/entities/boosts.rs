use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::boosts;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = boosts)]
pub struct BoostEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tier: String,
    pub expires_at: DateTime<Utc>,
    pub payment_ref: String,
    pub created_at: DateTime<Utc>,
}

impl BoostEntity {
    /// Boosts expire passively; nothing revokes them.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = boosts)]
pub struct InsertBoostEntity {
    pub user_id: Uuid,
    pub tier: String,
    pub expires_at: DateTime<Utc>,
    pub payment_ref: String,
}
