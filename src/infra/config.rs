use std::net::SocketAddr;

use env_helpers::get_env_default;
use secrecy::SecretString;
use url::Url;

use crate::domain::entities::price_map::PriceProductMap;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Paddle API base. Defaults to the sandbox; point at
    /// `https://api.paddle.com` for production.
    pub paddle_base_url: Url,
    pub paddle_api_key: Option<SecretString>,
    /// Zoho API base. Defaults to the US sandbox; other datacenters use a
    /// different TLD (`.in`, `.eu`, ...).
    pub zoho_base_url: Url,
    pub zoho_oauth_token: Option<SecretString>,
    pub zoho_organization_id: Option<String>,
    pub price_product_map: PriceProductMap,
    /// Wait before the single re-search after a lost customer-create race,
    /// covering Zoho's read-after-write consistency window.
    pub race_retry_backoff_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3000".parse().unwrap());

        let paddle_base_url: Url = get_env_default(
            "PADDLE_API_BASE_URL",
            "https://sandbox-api.paddle.com".parse().unwrap(),
        );
        let paddle_api_key = secret_var("PADDLE_API_KEY");

        let zoho_base_url: Url = get_env_default(
            "ZOHO_API_BASE_URL",
            "https://sandbox.zohoapis.com".parse().unwrap(),
        );
        let zoho_oauth_token = secret_var("ZOHO_OAUTH_TOKEN");
        let zoho_organization_id = std::env::var("ZOHO_ORGANIZATION_ID")
            .ok()
            .filter(|v| !v.is_empty());

        let price_product_map =
            PriceProductMap::from_spec(&get_env_default("PRICE_PRODUCT_MAP", String::new()));

        let race_retry_backoff_ms: u64 = get_env_default("RACE_RETRY_BACKOFF_MS", 2_000);

        Self {
            bind_addr,
            paddle_base_url,
            paddle_api_key,
            zoho_base_url,
            zoho_oauth_token,
            zoho_organization_id,
            price_product_map,
            race_retry_backoff_ms,
        }
    }

    /// Missing provider configuration is a startup warning, not a hard
    /// failure; affected requests fail downstream instead.
    pub fn warn_on_missing(&self) {
        if self.paddle_api_key.is_none() {
            tracing::warn!("PADDLE_API_KEY is not set; payer lookups will fail");
        }
        if self.zoho_oauth_token.is_none() {
            tracing::warn!("ZOHO_OAUTH_TOKEN is not set; invoicing calls will fail");
        }
        if self.zoho_organization_id.is_none() {
            tracing::warn!("ZOHO_ORGANIZATION_ID is not set; invoicing calls will fail");
        }
        if self.price_product_map.is_empty() {
            tracing::warn!("PRICE_PRODUCT_MAP is empty; every transaction will be rejected");
        }
    }
}

fn secret_var(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(|v| SecretString::new(v.into()))
}
