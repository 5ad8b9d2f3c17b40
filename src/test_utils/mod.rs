//! In-memory mock implementations of the provider ports.
//!
//! Every outbound call is appended to a shared [`CallLog`] so tests can
//! assert both which calls were made and their order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::price_map::PriceProductMap,
    infra::config::AppConfig,
    ports::{
        invoicing::{CustomerId, InvoiceDraft, InvoiceId, InvoicingPort},
        payer_directory::{PayerDetails, PayerDirectoryPort},
    },
    use_cases::reconciliation::{ReconciliationUseCases, RetryPolicy},
};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// App state wired to mock providers, a `pri_A=prod_X` price map, and a
/// zero-delay retry policy.
pub fn test_app_state(
    payer_directory: MockPayerDirectory,
    invoicing: MockInvoicing,
) -> AppState {
    let config = Arc::new(AppConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        paddle_base_url: "https://sandbox-api.paddle.com".parse().unwrap(),
        paddle_api_key: None,
        zoho_base_url: "https://sandbox.zohoapis.com".parse().unwrap(),
        zoho_oauth_token: None,
        zoho_organization_id: None,
        price_product_map: PriceProductMap::from_spec("pri_A=prod_X"),
        race_retry_backoff_ms: 0,
    });

    let reconciliation = ReconciliationUseCases::new(
        Arc::new(payer_directory),
        Arc::new(invoicing),
        config.price_product_map.clone(),
        RetryPolicy {
            max_retries: 1,
            backoff: Duration::from_millis(0),
        },
    );

    AppState {
        config,
        reconciliation: Arc::new(reconciliation),
    }
}

// ============================================================================
// MockPayerDirectory
// ============================================================================

pub struct MockPayerDirectory {
    calls: CallLog,
    /// `None` simulates a lookup without a usable email.
    payer: Option<PayerDetails>,
}

impl MockPayerDirectory {
    pub fn new(calls: CallLog, payer: Option<PayerDetails>) -> Self {
        Self { calls, payer }
    }
}

#[async_trait]
impl PayerDirectoryPort for MockPayerDirectory {
    async fn payer_details(&self, payer_ref: &str) -> AppResult<PayerDetails> {
        self.calls
            .lock()
            .unwrap()
            .push("paddle:payer-lookup".to_string());
        self.payer.clone().ok_or_else(|| {
            AppError::UnresolvablePayer(format!("no email for payer {payer_ref}"))
        })
    }
}

// ============================================================================
// MockInvoicing
// ============================================================================

pub enum CreateCustomerOutcome {
    Created(CustomerId),
    Duplicate,
    Error(String),
}

pub enum CreateInvoiceOutcome {
    Created(InvoiceId),
    /// Simulates a 2xx response whose body carries no invoice id.
    MissingId,
    Error(String),
}

#[derive(Default)]
struct InvoicingScript {
    search_results: VecDeque<Option<CustomerId>>,
    create_outcomes: VecDeque<CreateCustomerOutcome>,
    invoice_outcome: Option<CreateInvoiceOutcome>,
    email_fails: bool,
}

pub struct MockInvoicing {
    calls: CallLog,
    script: Mutex<InvoicingScript>,
    drafts: Arc<Mutex<Vec<InvoiceDraft>>>,
}

impl MockInvoicing {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            script: Mutex::new(InvoicingScript::default()),
            drafts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Results consumed in order by successive searches; an exhausted script
    /// keeps answering "no match".
    pub fn with_search_results(self, results: Vec<Option<CustomerId>>) -> Self {
        self.script.lock().unwrap().search_results = results.into();
        self
    }

    pub fn with_create_outcomes(self, outcomes: Vec<CreateCustomerOutcome>) -> Self {
        self.script.lock().unwrap().create_outcomes = outcomes.into();
        self
    }

    pub fn with_invoice_outcome(self, outcome: CreateInvoiceOutcome) -> Self {
        self.script.lock().unwrap().invoice_outcome = Some(outcome);
        self
    }

    pub fn with_failing_email(self) -> Self {
        self.script.lock().unwrap().email_fails = true;
        self
    }

    /// Drafts captured by `create_invoice`, for asserting amounts.
    pub fn drafts(&self) -> Arc<Mutex<Vec<InvoiceDraft>>> {
        self.drafts.clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl InvoicingPort for MockInvoicing {
    async fn find_customer_by_email(&self, _email: &str) -> AppResult<Option<CustomerId>> {
        self.record("zoho:customer-search");
        Ok(self
            .script
            .lock()
            .unwrap()
            .search_results
            .pop_front()
            .flatten())
    }

    async fn create_customer(&self, _display_name: &str, email: &str) -> AppResult<CustomerId> {
        self.record("zoho:customer-create");
        match self.script.lock().unwrap().create_outcomes.pop_front() {
            Some(CreateCustomerOutcome::Created(id)) => Ok(id),
            Some(CreateCustomerOutcome::Duplicate) => Err(AppError::DuplicateCustomer),
            Some(CreateCustomerOutcome::Error(msg)) => Err(AppError::Internal(msg)),
            None => Ok(CustomerId::new(format!("cust_for_{email}"))),
        }
    }

    async fn create_invoice(&self, draft: &InvoiceDraft) -> AppResult<InvoiceId> {
        self.record("zoho:invoice-create");
        self.drafts.lock().unwrap().push(draft.clone());
        match self.script.lock().unwrap().invoice_outcome.take() {
            Some(CreateInvoiceOutcome::Created(id)) => Ok(id),
            Some(CreateInvoiceOutcome::MissingId) => Err(AppError::InvoiceCreation(
                "success response missing invoice id".to_string(),
            )),
            Some(CreateInvoiceOutcome::Error(msg)) => Err(AppError::InvoiceCreation(msg)),
            None => Ok(InvoiceId::new("inv_default")),
        }
    }

    async fn email_invoice(&self, invoice_id: &InvoiceId, _recipient: &str) -> AppResult<()> {
        self.record("zoho:invoice-email");
        if self.script.lock().unwrap().email_fails {
            return Err(AppError::InvoiceDispatch(format!(
                "email send failed for {invoice_id}"
            )));
        }
        Ok(())
    }
}
