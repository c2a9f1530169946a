use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::notifications;

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = notifications)]
pub struct InsertNotificationEntity {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}
