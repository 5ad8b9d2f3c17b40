use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The webhook body was not parseable JSON. The only error that surfaces
    /// as a non-2xx response, so Paddle may redeliver.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// The payload parsed but required event fields were missing or unusable.
    /// Acknowledged to the sender and dropped before any outbound call.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("{0} credentials are not configured")]
    ProviderNotConfigured(&'static str),

    /// No usable email could be obtained for the payer. Nothing downstream
    /// can proceed without one.
    #[error("Unresolvable payer: {0}")]
    UnresolvablePayer(String),

    #[error("No product mapping for price reference {0}")]
    UnknownPriceRef(String),

    /// The invoicing provider reported the customer already exists. A
    /// concurrent create won the race; the caller re-searches.
    #[error("Customer already exists")]
    DuplicateCustomer,

    #[error("Customer reconciliation failed: {0}")]
    CustomerReconciliation(String),

    #[error("Invoice creation failed: {0}")]
    InvoiceCreation(String),

    #[error("Invoice dispatch failed: {0}")]
    InvoiceDispatch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Pipeline stage the error belongs to, for operator logs.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::InvalidPayload(_) | AppError::MalformedEvent(_) => "receive",
            AppError::UnknownPriceRef(_) => "price-map",
            AppError::UnresolvablePayer(_) => "payer-lookup",
            AppError::DuplicateCustomer | AppError::CustomerReconciliation(_) => {
                "customer-reconcile"
            }
            AppError::InvoiceCreation(_) => "invoice-create",
            AppError::InvoiceDispatch(_) => "invoice-email",
            AppError::ProviderNotConfigured(_) | AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    InvalidPayload,
    MalformedEvent,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPayload => "INVALID_PAYLOAD",
            ErrorCode::MalformedEvent => "MALFORMED_EVENT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
