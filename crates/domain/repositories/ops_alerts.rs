use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::ops_alerts::RefundIntentAlert;

#[automock]
#[async_trait]
pub trait OpsAlertClient {
    async fn send_refund_intent(&self, alert: RefundIntentAlert) -> Result<()>;
}
