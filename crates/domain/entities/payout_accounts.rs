use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payout_accounts;

/// Local mirror of a provider's Stripe connected account.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payout_accounts, primary_key(user_id))]
pub struct PayoutAccountEntity {
    pub user_id: Uuid,
    pub stripe_account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl PayoutAccountEntity {
    pub fn can_receive_transfers(&self) -> bool {
        self.payouts_enabled
    }
}
