use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payout_accounts::PayoutAccountEntity;

#[automock]
#[async_trait]
pub trait PayoutAccountRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<PayoutAccountEntity>>;

    /// Returns false when no local account mirrors `stripe_account_id`.
    async fn update_capabilities(
        &self,
        stripe_account_id: String,
        charges_enabled: bool,
        payouts_enabled: bool,
    ) -> Result<bool>;
}
