//! Paddle webhook receiver.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use tracing::{debug, error, info, warn};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::webhook_event::{TRANSACTION_COMPLETED, TransactionEvent},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/paddle-webhook", post(handle_paddle_webhook))
}

/// POST /paddle-webhook
///
/// Acknowledges receipt before processing completes: Paddle retries on any
/// non-2xx, and the Zoho side is not safe against duplicate replays, so the
/// pipeline runs in a detached task and its errors go to the operator log.
/// Only an unparseable body earns a 500, inviting redelivery.
async fn handle_paddle_webhook(
    State(app_state): State<AppState>,
    body: String,
) -> AppResult<impl IntoResponse> {
    let payload: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| AppError::InvalidPayload(e.to_string()))?;

    let event_type = payload["event_type"].as_str().unwrap_or("");
    if event_type != TRANSACTION_COMPLETED {
        debug!(event_type, "Acknowledging unhandled Paddle event type");
        return Ok((StatusCode::OK, "ignored"));
    }

    let event = match TransactionEvent::from_payload(&payload) {
        Ok(event) => event,
        Err(err) => {
            // Redelivery cannot fix a field that is not there; acknowledge
            // and drop before any outbound call.
            warn!(error = %err, "Discarding transaction.completed event with unusable fields");
            return Ok((StatusCode::OK, "accepted"));
        }
    };

    let reconciliation = app_state.reconciliation.clone();
    tokio::spawn(async move {
        let transaction_id = event.transaction_id.clone();
        match reconciliation.handle_completed_transaction(&event).await {
            Ok(outcome) => {
                info!(
                    transaction_id,
                    invoice_id = %outcome.invoice_id,
                    emailed = outcome.emailed,
                    "Reconciliation finished"
                );
            }
            Err(err) => {
                error!(
                    transaction_id,
                    stage = err.stage(),
                    error = %err,
                    "Reconciliation aborted; manual remediation may be needed"
                );
            }
        }
    });

    Ok((StatusCode::OK, "accepted"))
}
