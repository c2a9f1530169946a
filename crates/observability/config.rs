use std::env;
use url::Url;

#[derive(Clone, Debug)]
pub struct ServiceContext {
    pub service_name: String,
    pub environment: String,
    pub component: String,
}

impl ServiceContext {
    pub fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();

        let service_name = env_string("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = env_string("STAGE").unwrap_or_else(|| "unknown".to_string());

        Self {
            service_name,
            environment,
            component,
        }
    }
}

/// Parses OPS_DISCORD_WEBHOOK_URL. Returns the url (if any) and a warning to log once tracing is up.
pub(crate) fn ops_webhook_from_env() -> (Option<Url>, Option<String>) {
    match env_string("OPS_DISCORD_WEBHOOK_URL") {
        None => (None, None),
        Some(raw) => match Url::parse(&raw) {
            Ok(url) => (Some(url), None),
            // Never echo the raw URL, it embeds the webhook token.
            Err(err) => (
                None,
                Some(format!(
                    "OPS_DISCORD_WEBHOOK_URL is set but invalid; ops alerts disabled (parse error: {err})"
                )),
            ),
        },
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
