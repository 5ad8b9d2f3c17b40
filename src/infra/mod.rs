pub mod app;
pub mod config;
pub mod http_client;
pub mod paddle_client;
pub mod setup;
pub mod zoho_client;
