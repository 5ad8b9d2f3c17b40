use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app_error::AppResult;

/// Unique identifier for a customer record in the invoicing provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an invoice in the invoicing provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the invoicing provider needs to bill one transaction.
///
/// Provider field naming (`item_id` vs `product_id`, `rate` vs `price`) stays
/// inside the adapter; the pipeline only ever sees this shape.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub customer_id: CustomerId,
    /// Provider-side product/item reference, resolved via the price map.
    pub product_ref: String,
    /// Amount in display units (see `TransactionEvent::display_amount`).
    pub display_amount: f64,
    pub currency_code: String,
    pub date: NaiveDate,
}

/// Invoicing provider port - customer records, draft invoices, and invoice
/// delivery.
///
/// The provider is the system of record and the arbiter of the
/// create-or-find race; this service holds no locks and no state.
#[async_trait]
pub trait InvoicingPort: Send + Sync {
    /// Search the customer collection by exact email.
    ///
    /// Returns `Ok(None)` for "no match", including provider API variants
    /// that answer an empty search with a known not-found error signature.
    /// Multiple matches resolve to the first result.
    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<CustomerId>>;

    /// Create a customer record.
    ///
    /// A duplicate/already-exists signature from the provider maps to
    /// [`AppError::DuplicateCustomer`](crate::app_error::AppError) so the
    /// caller can resolve the race; any other failure is terminal.
    async fn create_customer(&self, display_name: &str, email: &str) -> AppResult<CustomerId>;

    /// Create a draft invoice.
    ///
    /// A success response without an invoice id is a creation failure;
    /// implementations must check for the id explicitly, not just the status.
    async fn create_invoice(&self, draft: &InvoiceDraft) -> AppResult<InvoiceId>;

    /// Trigger email delivery of an existing invoice.
    async fn email_invoice(&self, invoice_id: &InvoiceId, recipient_email: &str) -> AppResult<()>;
}
