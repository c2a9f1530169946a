use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::boosts::BoostEntity;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBoostDto {
    pub tier: String,
    pub expires_at: DateTime<Utc>,
}

impl From<BoostEntity> for ActiveBoostDto {
    fn from(value: BoostEntity) -> Self {
        Self {
            tier: value.tier,
            expires_at: value.expires_at,
        }
    }
}
