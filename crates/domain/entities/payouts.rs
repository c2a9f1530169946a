use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payouts;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payouts)]
pub struct PayoutEntity {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub booking_id: Uuid,
    pub gross_minor: i64,
    pub commission_minor: i64,
    pub net_minor: i64,
    pub commission_rate_bps: i32,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payouts)]
pub struct InsertPayoutEntity {
    pub provider_id: Uuid,
    pub booking_id: Uuid,
    pub gross_minor: i64,
    pub commission_minor: i64,
    pub net_minor: i64,
    pub commission_rate_bps: i32,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
}
