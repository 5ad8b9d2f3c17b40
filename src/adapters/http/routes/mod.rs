use axum::Router;

use crate::adapters::http::app_state::AppState;

pub mod webhooks;

pub fn router() -> Router<AppState> {
    Router::new().merge(webhooks::router())
}
