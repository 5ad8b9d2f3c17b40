use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    infra::{config::AppConfig, paddle_client::PaddleClient, zoho_client::ZohoClient},
    ports::{invoicing::InvoicingPort, payer_directory::PayerDirectoryPort},
    use_cases::reconciliation::{ReconciliationUseCases, RetryPolicy},
};

pub fn init_app_state() -> AppState {
    let config = Arc::new(AppConfig::from_env());
    config.warn_on_missing();

    let payer_directory = Arc::new(PaddleClient::new(&config)) as Arc<dyn PayerDirectoryPort>;
    let invoicing = Arc::new(ZohoClient::new(&config)) as Arc<dyn InvoicingPort>;

    let retry_policy = RetryPolicy {
        max_retries: 1,
        backoff: Duration::from_millis(config.race_retry_backoff_ms),
    };

    let reconciliation = ReconciliationUseCases::new(
        payer_directory,
        invoicing,
        config.price_product_map.clone(),
        retry_policy,
    );

    AppState {
        config,
        reconciliation: Arc::new(reconciliation),
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "billsync=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
