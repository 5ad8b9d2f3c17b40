use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, stage = self.stage(), "Request failed");

        match self {
            // A 500 is the only signal the payment provider gets that
            // redelivery may help.
            AppError::InvalidPayload(msg) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InvalidPayload,
                Some(msg),
            ),
            AppError::MalformedEvent(msg) => {
                error_resp(StatusCode::OK, ErrorCode::MalformedEvent, Some(msg))
            }
            // Pipeline errors never reach the webhook caller; the response
            // was already sent when the task was spawned. Anything that does
            // surface here is an internal fault.
            _ => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                None,
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
