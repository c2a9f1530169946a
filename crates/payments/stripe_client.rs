use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Signatures older than this are rejected to limit replay.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    success_url: String,
    cancel_url: String,
    currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: Option<String>,
    pub subscription: Option<String>,
    pub customer: Option<String>,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: Option<String>,
    pub status: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub billing_cycle_anchor: Option<i64>,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    /// Period start, falling back to the first item or the billing cycle anchor.
    pub fn period_start(&self) -> Option<i64> {
        self.current_period_start
            .or_else(|| {
                self.items
                    .data
                    .first()
                    .and_then(|item| item.current_period_start)
            })
            .or(self.billing_cycle_anchor)
    }

    /// Period end, falling back to the first item.
    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_end)
        })
    }
}

/// Connected account snapshot carried by `account.updated`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeAccount {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    Subscription,
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Subscription => "subscription",
            CheckoutMode::Payment => "payment",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutLineItem {
    /// A catalog price configured in the Stripe dashboard.
    Price(String),
    /// An ad-hoc amount, used for booking payments.
    Inline { name: String, amount_minor: i64 },
}

/// Everything needed to open one Checkout Session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub mode: CheckoutMode,
    pub line_item: CheckoutLineItem,
    pub customer_id: Option<String>,
    pub metadata: HashMap<String, String>,
    /// Platform fee kept when the charge is routed to a connected account.
    pub application_fee_minor: Option<i64>,
    pub transfer_destination: Option<String>,
}

impl StripeClient {
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        success_url: String,
        cancel_url: String,
        currency: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
            success_url,
            cancel_url,
            currency,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.clone()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.clone()),
            stripe_error_param = ?details.as_ref().and_then(|d| d.param.clone()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.clone()),
            context = %context,
            "stripe api request failed"
        );

        bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// Creates a Stripe customer tagged with our user id.
    pub async fn create_customer(&self, email: Option<String>, user_id: Uuid) -> Result<String> {
        // https://stripe.com/docs/api/customers/create
        let mut body = vec![("metadata[user_id]".to_string(), user_id.to_string())];
        if let Some(email) = email {
            body.push(("email".to_string(), email));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/customers"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        let parsed: CustomerResp = resp.json().await?;
        Ok(parsed.id)
    }

    /// Creates a Checkout Session and returns its URL.
    pub async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<String> {
        // https://stripe.com/docs/api/checkout/sessions/create
        let body = self.checkout_form(request);

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow!("Stripe Checkout session URL is missing"))
    }

    fn checkout_form(&self, request: CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut body: Vec<(String, String)> = vec![
            ("mode".to_string(), request.mode.as_str().to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        match request.line_item {
            CheckoutLineItem::Price(price_id) => {
                body.push(("line_items[0][price]".to_string(), price_id));
            }
            CheckoutLineItem::Inline { name, amount_minor } => {
                body.push((
                    "line_items[0][price_data][currency]".to_string(),
                    self.currency.clone(),
                ));
                body.push((
                    "line_items[0][price_data][unit_amount]".to_string(),
                    amount_minor.to_string(),
                ));
                body.push((
                    "line_items[0][price_data][product_data][name]".to_string(),
                    name,
                ));
            }
        }

        if let Some(customer) = request.customer_id {
            body.push(("customer".to_string(), customer));
        }

        if let Some(fee) = request.application_fee_minor {
            body.push((
                "payment_intent_data[application_fee_amount]".to_string(),
                fee.to_string(),
            ));
        }

        if let Some(destination) = request.transfer_destination {
            body.push((
                "payment_intent_data[transfer_data][destination]".to_string(),
                destination,
            ));
        }

        for (key, value) in request.metadata {
            body.push((format!("metadata[{}]", key), value));
        }

        body
    }

    pub async fn retrieve_subscription(&self, subscription_id: &str) -> Result<StripeSubscription> {
        // https://stripe.com/docs/api/subscriptions/retrieve
        let resp = self
            .http
            .get(format!("{STRIPE_API_BASE}/subscriptions/{}", subscription_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve subscription").await?;

        let subscription: StripeSubscription = resp.json().await?;
        Ok(subscription)
    }

    /// Verifies the `Stripe-Signature` header. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> Result<()> {
        verify_signature_at(
            &self.webhook_secret,
            payload,
            signature_header,
            chrono::Utc::now().timestamp(),
        )
    }

    pub fn parse_event(payload: &[u8]) -> Result<StripeEvent> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn extract_checkout_session(event: &StripeEvent) -> Option<StripeCheckoutSession> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    pub fn extract_subscription(event: &StripeEvent) -> Option<StripeSubscription> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    pub fn extract_account(event: &StripeEvent) -> Option<StripeAccount> {
        serde_json::from_value(event.data.object.clone()).ok()
    }
}

/// Checks `t=…,v1=…` against HMAC-SHA256(secret, "{t}.{payload}") at the given clock.
pub fn verify_signature_at(
    webhook_secret: &str,
    payload: &[u8],
    signature_header: &str,
    now_ts: i64,
) -> Result<()> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = Some(rest);
        } else if let Some(rest) = part.strip_prefix("v1=") {
            signatures.push(rest);
        }
    }

    let timestamp = timestamp.ok_or_else(|| anyhow!("missing timestamp in stripe-signature"))?;
    if signatures.is_empty() {
        bail!("missing v1 in stripe-signature");
    }

    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| anyhow!("invalid timestamp in stripe-signature"))?;
    if (now_ts - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        bail!("stripe-signature timestamp outside tolerance");
    }

    for signature in signatures {
        let Ok(provided) = hex::decode(signature) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&provided).is_ok() {
            return Ok(());
        }
    }

    bail!("invalid webhook signature")
}
