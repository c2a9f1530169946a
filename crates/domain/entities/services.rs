use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::services;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = services)]
pub struct ServiceEntity {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub price_minor: i64,
    pub duration_minutes: i32,
    pub is_active: bool,
}
