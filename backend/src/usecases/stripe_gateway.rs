use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::payments::stripe_client::{CheckoutSessionRequest, StripeClient, StripeSubscription};
use uuid::Uuid;

/// The slice of Stripe the use cases depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_customer(&self, email: Option<String>, user_id: Uuid) -> AnyResult<String>;

    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> AnyResult<String>;

    async fn retrieve_subscription(&self, subscription_id: String) -> AnyResult<StripeSubscription>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<()>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_customer(&self, email: Option<String>, user_id: Uuid) -> AnyResult<String> {
        self.create_customer(email, user_id).await
    }

    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> AnyResult<String> {
        self.create_checkout_session(request).await
    }

    async fn retrieve_subscription(&self, subscription_id: String) -> AnyResult<StripeSubscription> {
        self.retrieve_subscription(&subscription_id).await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<()> {
        self.verify_webhook_signature(payload, signature)
    }
}
