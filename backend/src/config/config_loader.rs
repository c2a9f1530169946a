use anyhow::{Context, Result};

use super::config_model::{
    App, Auth, BackendServer, Database, DotEnvyConfig, Stripe, StripePrices,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let auth = get_auth_secret()?;

    let app = App {
        base_url: required("APP_BASE_URL")?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        currency: std::env::var("STRIPE_CURRENCY")
            .ok()
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "usd".to_string()),
    };

    let stripe_prices = StripePrices {
        artist_mid: required("STRIPE_PRICE_ARTIST_MID")?,
        artist_pro: required("STRIPE_PRICE_ARTIST_PRO")?,
        provider_mid: required("STRIPE_PRICE_PROVIDER_MID")?,
        provider_pro: required("STRIPE_PRICE_PROVIDER_PRO")?,
        boost_standard: required("STRIPE_PRICE_BOOST_STANDARD")?,
        boost_premium: required("STRIPE_PRICE_BOOST_PREMIUM")?,
        boost_mega: required("STRIPE_PRICE_BOOST_MEGA")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        app,
        stripe,
        stripe_prices,
    })
}

pub fn get_auth_secret() -> Result<Auth> {
    dotenvy::dotenv().ok();

    Ok(Auth {
        jwt_secret: required("JWT_SECRET")?,
    })
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is invalid"))
}
