use async_trait::async_trait;

use crate::app_error::AppResult;

/// Canonical contact details for a payer, fetched fresh per event and never
/// cached.
#[derive(Debug, Clone)]
pub struct PayerDetails {
    pub email: String,
    pub display_name: Option<String>,
}

impl PayerDetails {
    /// Name to bill under; payers without a name are billed by email.
    pub fn display_name_or_email(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Payer directory port - resolves an opaque payer reference from the payment
/// provider into contact details.
#[async_trait]
pub trait PayerDirectoryPort: Send + Sync {
    /// Look up a payer by its provider-assigned reference.
    ///
    /// Any failure (network, non-2xx, missing email) is
    /// [`AppError::UnresolvablePayer`](crate::app_error::AppError) and is not
    /// retried: nothing downstream can invoice an unknown payer.
    async fn payer_details(&self, payer_ref: &str) -> AppResult<PayerDetails>;
}
