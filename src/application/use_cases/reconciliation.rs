//! The reconciliation pipeline: one completed payment-provider transaction
//! turns into a customer record, a draft invoice, and an invoice email in the
//! invoicing provider.
//!
//! Strictly sequential; each step depends on the previous one. No step
//! retries automatically, with one exception: a customer create that loses a
//! duplicate race is resolved by a single delayed re-search.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{price_map::PriceProductMap, webhook_event::TransactionEvent},
    ports::{
        invoicing::{CustomerId, InvoiceDraft, InvoiceId, InvoicingPort},
        payer_directory::{PayerDetails, PayerDirectoryPort},
    },
};

/// Bounds the re-search after a lost create race.
///
/// Parameterized rather than hardcoded so tests can inject a zero backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// How many delayed re-searches a duplicate-create error buys. The
    /// provider's read-after-write window is short; one is enough.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_secs(2),
        }
    }
}

/// What one pipeline execution produced.
#[derive(Debug, Clone)]
pub struct ReconciliationOutcome {
    pub customer_id: CustomerId,
    pub invoice_id: InvoiceId,
    /// False when the invoice was created but delivery failed; the draft
    /// stands in the provider for manual, out-of-band sending.
    pub emailed: bool,
}

pub struct ReconciliationUseCases {
    payer_directory: Arc<dyn PayerDirectoryPort>,
    invoicing: Arc<dyn InvoicingPort>,
    price_map: PriceProductMap,
    retry_policy: RetryPolicy,
}

impl ReconciliationUseCases {
    pub fn new(
        payer_directory: Arc<dyn PayerDirectoryPort>,
        invoicing: Arc<dyn InvoicingPort>,
        price_map: PriceProductMap,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            payer_directory,
            invoicing,
            price_map,
            retry_policy,
        }
    }

    /// Run the full pipeline for one completed transaction.
    ///
    /// The price mapping is resolved first: it is a local lookup, and an
    /// unmapped price must abort before any provider call is spent.
    pub async fn handle_completed_transaction(
        &self,
        event: &TransactionEvent,
    ) -> AppResult<ReconciliationOutcome> {
        let product_ref = self.price_map.resolve(&event.price_ref)?.to_string();

        let payer = self.payer_directory.payer_details(&event.payer_ref).await?;

        let customer_id = self.reconcile_customer(&payer).await?;

        let draft = InvoiceDraft {
            customer_id: customer_id.clone(),
            product_ref,
            display_amount: event.display_amount(),
            currency_code: event.currency_code.clone(),
            date: event.invoice_date(),
        };
        let invoice_id = self.invoicing.create_invoice(&draft).await?;

        // Delivery failure does not unwind the invoice: it stays in draft and
        // gets sent by hand.
        let emailed = match self.invoicing.email_invoice(&invoice_id, &payer.email).await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    transaction_id = %event.transaction_id,
                    invoice_id = %invoice_id,
                    recipient = %payer.email,
                    %error,
                    "Invoice created but email delivery failed"
                );
                false
            }
        };

        info!(
            transaction_id = %event.transaction_id,
            customer_id = %customer_id,
            invoice_id = %invoice_id,
            amount = draft.display_amount,
            currency = %draft.currency_code,
            emailed,
            "Transaction reconciled"
        );

        Ok(ReconciliationOutcome {
            customer_id,
            invoice_id,
            emailed,
        })
    }

    /// Find-or-create a customer record for the payer's email.
    ///
    /// Concurrent executions for the same email converge on one customer id:
    /// whoever loses the create race gets `DuplicateCustomer` back, waits out
    /// the provider's read-after-write window, and re-searches. The provider
    /// is the arbiter; no lock is held here.
    pub async fn reconcile_customer(&self, payer: &PayerDetails) -> AppResult<CustomerId> {
        if let Some(customer_id) = self.invoicing.find_customer_by_email(&payer.email).await? {
            return Ok(customer_id);
        }

        match self
            .invoicing
            .create_customer(payer.display_name_or_email(), &payer.email)
            .await
        {
            Ok(customer_id) => Ok(customer_id),
            Err(AppError::DuplicateCustomer) => {
                for attempt in 1..=self.retry_policy.max_retries {
                    warn!(
                        email = %payer.email,
                        attempt,
                        "Customer create lost a duplicate race, re-searching"
                    );
                    tokio::time::sleep(self.retry_policy.backoff).await;
                    if let Some(customer_id) =
                        self.invoicing.find_customer_by_email(&payer.email).await?
                    {
                        return Ok(customer_id);
                    }
                }
                Err(AppError::CustomerReconciliation(format!(
                    "provider reported {} as duplicate but re-search found no record",
                    payer.email
                )))
            }
            Err(error) => Err(error),
        }
    }
}
