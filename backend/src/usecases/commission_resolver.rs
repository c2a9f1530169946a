use anyhow::Result;
use crates::domain::{
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        commission::{CommissionRate, rate_for},
        enums::{plan_tiers::PlanTier, subscription_statuses::SubscriptionStatus},
    },
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Resolves the commission a user's sales are charged: their active tier's rate, or FREE's.
pub struct CommissionResolver {
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
}

impl CommissionResolver {
    pub fn new(subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>) -> Self {
        Self { subscription_repo }
    }

    pub async fn rate_for_user(&self, user_id: Uuid) -> Result<CommissionRate> {
        let subscription = self.subscription_repo.find_by_user_id(user_id).await?;

        match subscription {
            Some(subscription) if subscription.status() == SubscriptionStatus::Active => {
                let plan = subscription.plan();
                debug!(
                    %user_id,
                    plan = %plan,
                    "commission_resolver: using active subscription plan"
                );
                Ok(rate_for(plan))
            }
            Some(subscription) => {
                debug!(
                    %user_id,
                    status = %subscription.status(),
                    "commission_resolver: subscription not active, using free rate"
                );
                Ok(rate_for(PlanTier::Free))
            }
            None => {
                debug!(%user_id, "commission_resolver: no subscription, using free rate");
                Ok(rate_for(PlanTier::Free))
            }
        }
    }
}
