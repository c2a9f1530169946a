use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{SubscriptionEntity, UpsertSubscriptionEntity};
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: String,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Stores the customer reference, creating the user's FREE row when it does not exist yet.
    async fn upsert_customer_ref(&self, user_id: Uuid, stripe_customer_id: String) -> Result<()>;

    /// One row per user: inserts or overwrites plan, status, rate and Stripe references.
    async fn upsert_after_checkout(
        &self,
        subscription: UpsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity>;

    async fn update_status_and_period_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: String,
        status: SubscriptionStatus,
        current_period_start: Option<DateTime<Utc>>,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Drops the subscription back to FREE: cancelled status, FREE plan and rate.
    async fn downgrade_to_free_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: String,
        commission_rate_bps: i32,
    ) -> Result<bool>;
}
