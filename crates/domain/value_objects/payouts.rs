use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::payouts::PayoutEntity;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayoutDto {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub gross_minor: i64,
    pub commission_minor: i64,
    pub net_minor: i64,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<PayoutEntity> for PayoutDto {
    fn from(value: PayoutEntity) -> Self {
        Self {
            id: value.id,
            booking_id: value.booking_id,
            gross_minor: value.gross_minor,
            commission_minor: value.commission_minor,
            net_minor: value.net_minor,
            status: value.status,
            scheduled_at: value.scheduled_at,
            processed_at: value.processed_at,
        }
    }
}
