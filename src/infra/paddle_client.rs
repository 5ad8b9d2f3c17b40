//! Paddle customer lookups, implementing the payer directory port.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    app_error::{AppError, AppResult},
    infra::{config::AppConfig, http_client},
    ports::payer_directory::{PayerDetails, PayerDirectoryPort},
};

pub struct PaddleClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl PaddleClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: http_client::build_client(),
            base_url: config
                .paddle_base_url
                .as_str()
                .trim_end_matches('/')
                .to_string(),
            api_key: config.paddle_api_key.clone(),
        }
    }
}

#[async_trait]
impl PayerDirectoryPort for PaddleClient {
    async fn payer_details(&self, payer_ref: &str) -> AppResult<PayerDetails> {
        if payer_ref.is_empty() {
            return Err(AppError::UnresolvablePayer(
                "empty payer reference".to_string(),
            ));
        }
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(AppError::ProviderNotConfigured("Paddle"))?;

        let response = self
            .client
            .get(format!("{}/customers/{}", self.base_url, payer_ref))
            .bearer_auth(api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                AppError::UnresolvablePayer(format!("Paddle request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::UnresolvablePayer(format!("Failed to read Paddle response: {e}"))
        })?;

        parse_customer_response(payer_ref, status, &body)
    }
}

fn parse_customer_response(
    payer_ref: &str,
    status: StatusCode,
    body: &str,
) -> AppResult<PayerDetails> {
    if !status.is_success() {
        tracing::error!(payer_ref, %status, body, "Paddle customer lookup failed");
        return Err(AppError::UnresolvablePayer(format!(
            "Paddle returned {status} for {payer_ref}"
        )));
    }

    let envelope: PaddleCustomerEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::error!(payer_ref, body, error = %e, "Failed to parse Paddle response");
        AppError::UnresolvablePayer(format!("unparseable Paddle response: {e}"))
    })?;

    let customer = envelope.data;
    let email = customer
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            tracing::warn!(payer_ref, "Paddle customer record carries no email");
            AppError::UnresolvablePayer(format!("no email on Paddle customer {payer_ref}"))
        })?;

    Ok(PayerDetails {
        email,
        display_name: customer.name.filter(|n| !n.is_empty()),
    })
}

#[derive(Debug, Deserialize)]
struct PaddleCustomerEnvelope {
    data: PaddleCustomer,
}

#[derive(Debug, Deserialize)]
struct PaddleCustomer {
    email: Option<String>,
    name: Option<String>,
}
