use crates::domain::value_objects::enums::{
    boost_tiers::BoostTier, plan_tiers::PlanTier, user_roles::UserRole,
};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub app: App,
    pub stripe: Stripe,
    pub stripe_prices: StripePrices,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct App {
    pub base_url: String,
}

impl App {
    pub fn checkout_success_url(&self) -> String {
        format!(
            "{}/payments/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.base_url.trim_end_matches('/')
        )
    }

    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/payments/cancel", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub currency: String,
}

/// Stripe price ids configured per role and tier.
#[derive(Debug, Clone, Default)]
pub struct StripePrices {
    pub artist_mid: String,
    pub artist_pro: String,
    pub provider_mid: String,
    pub provider_pro: String,
    pub boost_standard: String,
    pub boost_premium: String,
    pub boost_mega: String,
}

impl StripePrices {
    /// FREE has no price; it is the absence of a subscription.
    pub fn subscription_price(&self, role: UserRole, tier: PlanTier) -> Option<&str> {
        let price = match (role, tier) {
            (_, PlanTier::Free) => return None,
            (UserRole::Artist, PlanTier::Mid) => &self.artist_mid,
            (UserRole::Artist, PlanTier::Pro) => &self.artist_pro,
            (UserRole::Provider, PlanTier::Mid) => &self.provider_mid,
            (UserRole::Provider, PlanTier::Pro) => &self.provider_pro,
        };
        Some(price.as_str()).filter(|p| !p.is_empty())
    }

    pub fn boost_price(&self, tier: BoostTier) -> Option<&str> {
        let price = match tier {
            BoostTier::Standard => &self.boost_standard,
            BoostTier::Premium => &self.boost_premium,
            BoostTier::Mega => &self.boost_mega,
        };
        Some(price.as_str()).filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_urls_ignore_trailing_slash() {
        let app = App {
            base_url: "https://market.test/".to_string(),
        };
        assert_eq!(
            app.checkout_success_url(),
            "https://market.test/payments/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(app.checkout_cancel_url(), "https://market.test/payments/cancel");
    }

    #[test]
    fn free_tier_and_blank_prices_have_no_price() {
        let prices = StripePrices {
            provider_pro: "price_provider_pro".to_string(),
            ..Default::default()
        };
        assert_eq!(prices.subscription_price(UserRole::Provider, PlanTier::Free), None);
        assert_eq!(prices.subscription_price(UserRole::Artist, PlanTier::Pro), None);
        assert_eq!(
            prices.subscription_price(UserRole::Provider, PlanTier::Pro),
            Some("price_provider_pro")
        );
    }
}
