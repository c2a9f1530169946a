use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};
use url::Url;

use super::config::ServiceContext;
use crate::domain::{
    repositories::ops_alerts::OpsAlertClient,
    value_objects::{notifications::format_minor, ops_alerts::RefundIntentAlert},
};

/// Posts operational alerts to a Discord channel. Without a webhook url the alert is only logged.
pub struct DiscordOpsAlertClient {
    webhook_url: Option<Url>,
    client: Client,
    context: ServiceContext,
}

impl DiscordOpsAlertClient {
    pub fn new(webhook_url: Option<Url>, context: ServiceContext) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            webhook_url,
            client,
            context,
        }
    }

    fn format_refund_intent(&self, alert: &RefundIntentAlert) -> String {
        let lines = [
            format!(
                "**{}** `{}` `{}` refund required",
                self.context.service_name, self.context.environment, self.context.component
            ),
            format!("> {}", alert.reason.trim()),
            format!("- `booking_id` = `{}`", alert.booking_id),
            format!("- `buyer_id` = `{}`", alert.buyer_id),
            format!("- `payment_ref` = `{}`", alert.payment_ref),
            format!("- `amount` = `{}`", format_minor(alert.amount_minor)),
        ];

        truncate_for_discord(lines.join("\n"))
    }

    async fn post(&self, webhook_url: Url, content: String) -> Result<()> {
        let response = self
            .client
            .post(webhook_url)
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "discord webhook returned non-success status: {}",
            response.status()
        ))
    }
}

#[async_trait]
impl OpsAlertClient for DiscordOpsAlertClient {
    async fn send_refund_intent(&self, alert: RefundIntentAlert) -> Result<()> {
        let Some(webhook_url) = self.webhook_url.clone() else {
            error!(
                booking_id = %alert.booking_id,
                buyer_id = %alert.buyer_id,
                payment_ref = %alert.payment_ref,
                amount_minor = alert.amount_minor,
                reason = %alert.reason,
                "ops: refund required (discord alerts disabled)"
            );
            return Ok(());
        };

        let content = self.format_refund_intent(&alert);
        self.post(webhook_url, content).await?;

        info!(
            booking_id = %alert.booking_id,
            payment_ref = %alert.payment_ref,
            "ops: refund intent alert sent"
        );
        Ok(())
    }
}

fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("discord webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("discord webhook connection failed");
    }
    anyhow!("discord webhook request failed")
}

fn truncate_for_discord(content: String) -> String {
    const LIMIT: usize = 2000;
    const SUFFIX: &str = "\n… (truncated)";

    if content.chars().count() <= LIMIT {
        return content;
    }

    let allowed = LIMIT.saturating_sub(SUFFIX.chars().count());
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn context() -> ServiceContext {
        ServiceContext {
            service_name: "bookings".to_string(),
            environment: "test".to_string(),
            component: "backend".to_string(),
        }
    }

    #[test]
    fn refund_intent_message_lists_payment_details() {
        let client = DiscordOpsAlertClient::new(None, context());
        let alert = RefundIntentAlert {
            booking_id: Uuid::nil(),
            buyer_id: Uuid::nil(),
            payment_ref: "pi_123".to_string(),
            amount_minor: 15_000,
            reason: "booking cancelled before payment".to_string(),
        };

        let content = client.format_refund_intent(&alert);

        assert!(content.contains("refund required"));
        assert!(content.contains("`pi_123`"));
        assert!(content.contains("`150.00`"));
    }

    #[test]
    fn long_messages_are_truncated() {
        let content = truncate_for_discord("x".repeat(5000));
        assert_eq!(content.chars().count(), 2000);
        assert!(content.ends_with("(truncated)"));
    }

    #[tokio::test]
    async fn disabled_client_only_logs() {
        let client = DiscordOpsAlertClient::new(None, context());
        let alert = RefundIntentAlert {
            booking_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            payment_ref: "pi_1".to_string(),
            amount_minor: 100,
            reason: "test".to_string(),
        };

        assert!(client.send_refund_intent(alert).await.is_ok());
    }
}
