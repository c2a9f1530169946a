mod config;
mod discord;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use config::ServiceContext;
pub use discord::DiscordOpsAlertClient;

pub fn init_observability(component: &str) -> Result<()> {
    let context = ServiceContext::from_env(component);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so `TZ=...` shows the offset in logs.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    info!(
        service = %context.service_name,
        environment = %context.environment,
        component = %context.component,
        "observability initialized"
    );

    Ok(())
}

/// Builds the ops alert client from the environment, logging when alerts are disabled.
pub fn ops_alert_client_from_env(component: &str) -> DiscordOpsAlertClient {
    let context = ServiceContext::from_env(component);
    let (webhook_url, warning) = config::ops_webhook_from_env();

    if let Some(warning) = warning {
        warn!(warning = %warning, "observability config warning");
    }
    if webhook_url.is_none() {
        info!(
            service = %context.service_name,
            "ops discord alerts disabled; refund intents will only be logged"
        );
    }

    DiscordOpsAlertClient::new(webhook_url, context)
}
