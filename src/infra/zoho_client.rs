//! Zoho Invoice contacts, invoices, and invoice email, implementing the
//! invoicing port.
//!
//! All Zoho field naming and error-code classification lives here; the
//! pipeline only sees the port types.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    app_error::{AppError, AppResult},
    infra::{config::AppConfig, http_client},
    ports::invoicing::{CustomerId, InvoiceDraft, InvoiceId, InvoicingPort},
};

const ORGANIZATION_HEADER: &str = "X-com-zoho-invoice-organizationid";

const LINE_ITEM_NAME: &str = "Subscription Payment";
const LINE_ITEM_DESCRIPTION: &str = "Payment processed via Paddle.";

const INVOICE_EMAIL_SUBJECT: &str = "Your Invoice from Autobot";
const INVOICE_EMAIL_BODY: &str = "Thank you for your business! <br><br>\
    Please find your invoice attached.<br><br>Regards,<br>Autobot Team";

/// Zoho error codes with special meaning for the reconciler.
///
/// Which codes mean what varies by API version and datacenter, so this is
/// adapter configuration rather than pipeline logic.
#[derive(Debug, Clone)]
pub struct ZohoErrorSignatures {
    /// Codes some API variants return for an empty contact search instead of
    /// an empty list. Treated as "no match found".
    pub not_found_codes: Vec<i64>,
    /// Codes meaning a contact with this name/email already exists, i.e. a
    /// concurrent create won the race.
    pub duplicate_codes: Vec<i64>,
}

impl Default for ZohoErrorSignatures {
    fn default() -> Self {
        Self {
            not_found_codes: vec![1002],
            duplicate_codes: vec![3062],
        }
    }
}

pub struct ZohoClient {
    client: Client,
    base_url: String,
    oauth_token: Option<SecretString>,
    organization_id: Option<String>,
    signatures: ZohoErrorSignatures,
}

impl ZohoClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_signatures(config, ZohoErrorSignatures::default())
    }

    pub fn with_signatures(config: &AppConfig, signatures: ZohoErrorSignatures) -> Self {
        Self {
            client: http_client::build_client(),
            base_url: config
                .zoho_base_url
                .as_str()
                .trim_end_matches('/')
                .to_string(),
            oauth_token: config.zoho_oauth_token.clone(),
            organization_id: config.zoho_organization_id.clone(),
            signatures,
        }
    }

    fn contacts_url(&self) -> String {
        format!("{}/invoice/v3/contacts", self.base_url)
    }

    fn invoices_url(&self) -> String {
        format!("{}/invoice/v3/invoices", self.base_url)
    }

    fn credentials(&self) -> AppResult<(String, &str)> {
        let token = self
            .oauth_token
            .as_ref()
            .ok_or(AppError::ProviderNotConfigured("Zoho"))?;
        let org_id = self
            .organization_id
            .as_deref()
            .ok_or(AppError::ProviderNotConfigured("Zoho"))?;
        Ok((format!("Zoho-oauthtoken {}", token.expose_secret()), org_id))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> AppResult<reqwest::RequestBuilder> {
        let (auth, org_id) = self.credentials()?;
        let auth = HeaderValue::from_str(&auth)
            .map_err(|_| AppError::Internal("invalid Zoho token characters".to_string()))?;
        Ok(builder
            .header("Authorization", auth)
            .header(ORGANIZATION_HEADER, org_id))
    }

    async fn read(response: reqwest::Response) -> AppResult<(StatusCode, String)> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read Zoho response: {e}")))?;
        Ok((status, body))
    }
}

#[async_trait]
impl InvoicingPort for ZohoClient {
    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<CustomerId>> {
        let request = self.authed(self.client.get(self.contacts_url()))?;
        let response = request
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Zoho contact search failed: {e}")))?;

        let (status, body) = Self::read(response).await?;
        parse_contact_search(status, &body, &self.signatures)
    }

    async fn create_customer(&self, display_name: &str, email: &str) -> AppResult<CustomerId> {
        let payload = json!({
            "contact_name": display_name,
            "email": email,
        });

        let request = self.authed(self.client.post(self.contacts_url()))?;
        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Zoho contact create failed: {e}")))?;

        let (status, body) = Self::read(response).await?;
        parse_contact_create(status, &body, &self.signatures)
    }

    async fn create_invoice(&self, draft: &InvoiceDraft) -> AppResult<InvoiceId> {
        let payload = json!({
            "customer_id": draft.customer_id.as_str(),
            "line_items": [{
                "item_id": draft.product_ref,
                "name": LINE_ITEM_NAME,
                "description": LINE_ITEM_DESCRIPTION,
                "rate": draft.display_amount,
                "quantity": 1,
            }],
            "currency_code": draft.currency_code,
            "date": draft.date.format("%Y-%m-%d").to_string(),
        });

        let request = self.authed(self.client.post(self.invoices_url()))?;
        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::InvoiceCreation(format!("Zoho request failed: {e}")))?;

        let (status, body) = Self::read(response).await?;
        parse_invoice_create(status, &body)
    }

    async fn email_invoice(&self, invoice_id: &InvoiceId, recipient_email: &str) -> AppResult<()> {
        let payload = EmailInvoiceRequest {
            to_mail_ids: vec![recipient_email.to_string()],
            subject: INVOICE_EMAIL_SUBJECT.to_string(),
            body: INVOICE_EMAIL_BODY.to_string(),
        };

        let url = format!("{}/{}/email", self.invoices_url(), invoice_id.as_str());
        let request = self.authed(self.client.post(url))?;
        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::InvoiceDispatch(format!("Zoho request failed: {e}")))?;

        let (status, body) = Self::read(response).await?;
        if !status.is_success() {
            tracing::error!(invoice_id = %invoice_id, %status, body, "Zoho invoice email failed");
            return Err(AppError::InvoiceDispatch(format!(
                "Zoho returned {status} emailing invoice {invoice_id}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Response handling
// ============================================================================

fn parse_contact_search(
    status: StatusCode,
    body: &str,
    signatures: &ZohoErrorSignatures,
) -> AppResult<Option<CustomerId>> {
    if !status.is_success() {
        // Some API variants answer an empty search with an error instead of
        // an empty list.
        if let Some(code) = zoho_error_code(body) {
            if signatures.not_found_codes.contains(&code) {
                return Ok(None);
            }
        }
        tracing::error!(%status, body, "Zoho contact search failed");
        return Err(AppError::Internal(format!(
            "Zoho contact search returned {status}"
        )));
    }

    let list: ZohoContactList = serde_json::from_str(body).map_err(|e| {
        tracing::error!(body, error = %e, "Failed to parse Zoho contact list");
        AppError::Internal(format!("unparseable Zoho contact list: {e}"))
    })?;

    // Multiple matches for one email resolve to the first result. Zoho
    // documents no ordering; this is deliberately first-match-wins.
    Ok(list
        .contacts
        .into_iter()
        .next()
        .map(|c| CustomerId::new(c.contact_id)))
}

fn parse_contact_create(
    status: StatusCode,
    body: &str,
    signatures: &ZohoErrorSignatures,
) -> AppResult<CustomerId> {
    if !status.is_success() {
        if let Some(code) = zoho_error_code(body) {
            if signatures.duplicate_codes.contains(&code) {
                return Err(AppError::DuplicateCustomer);
            }
        }
        tracing::error!(%status, body, "Zoho contact create failed");
        return Err(AppError::Internal(format!(
            "Zoho contact create returned {status}"
        )));
    }

    let envelope: ZohoContactEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::error!(body, error = %e, "Failed to parse Zoho contact response");
        AppError::Internal(format!("unparseable Zoho contact response: {e}"))
    })?;

    envelope
        .contact
        .and_then(|c| c.contact_id)
        .filter(|id| !id.is_empty())
        .map(CustomerId::new)
        .ok_or_else(|| {
            tracing::error!(body, "Zoho contact created but response carries no id");
            AppError::CustomerReconciliation("create response missing contact id".to_string())
        })
}

fn parse_invoice_create(status: StatusCode, body: &str) -> AppResult<InvoiceId> {
    if !status.is_success() {
        tracing::error!(%status, body, "Zoho invoice create failed");
        return Err(AppError::InvoiceCreation(format!(
            "Zoho returned {status}"
        )));
    }

    let envelope: ZohoInvoiceEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::error!(body, error = %e, "Failed to parse Zoho invoice response");
        AppError::InvoiceCreation(format!("unparseable Zoho invoice response: {e}"))
    })?;

    // A 2xx without an invoice id is still a failure; the status alone proves
    // nothing.
    match envelope.invoice.and_then(|i| i.invoice_id).filter(|id| !id.is_empty()) {
        Some(id) => Ok(InvoiceId::new(id)),
        None => {
            tracing::error!(body, "Zoho invoice response carries no invoice id");
            Err(AppError::InvoiceCreation(
                "success response missing invoice id".to_string(),
            ))
        }
    }
}

fn zoho_error_code(body: &str) -> Option<i64> {
    serde_json::from_str::<ZohoErrorBody>(body)
        .ok()
        .map(|e| e.code)
}

// ============================================================================
// Zoho wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ZohoErrorBody {
    code: i64,
    #[allow(dead_code)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZohoContactList {
    #[serde(default)]
    contacts: Vec<ZohoContactSummary>,
}

#[derive(Debug, Deserialize)]
struct ZohoContactSummary {
    contact_id: String,
}

#[derive(Debug, Deserialize)]
struct ZohoContactEnvelope {
    contact: Option<ZohoContact>,
}

#[derive(Debug, Deserialize)]
struct ZohoContact {
    contact_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZohoInvoiceEnvelope {
    invoice: Option<ZohoInvoice>,
}

#[derive(Debug, Deserialize)]
struct ZohoInvoice {
    invoice_id: Option<String>,
    #[allow(dead_code)]
    invoice_number: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmailInvoiceRequest {
    to_mail_ids: Vec<String>,
    subject: String,
    body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signatures() -> ZohoErrorSignatures {
        ZohoErrorSignatures::default()
    }

    // =========================================================================
    // Contact search
    // =========================================================================

    #[test]
    fn search_hit_returns_first_contact() {
        let body = r#"{"contacts":[{"contact_id":"cust_1"},{"contact_id":"cust_2"}]}"#;

        let found = parse_contact_search(StatusCode::OK, body, &signatures()).unwrap();
        assert_eq!(found, Some(CustomerId::new("cust_1")));
    }

    #[test]
    fn empty_search_returns_none() {
        let body = r#"{"contacts":[]}"#;

        let found = parse_contact_search(StatusCode::OK, body, &signatures()).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn configured_not_found_code_maps_to_none() {
        let body = r#"{"code":1002,"message":"Contact does not exist."}"#;

        let found =
            parse_contact_search(StatusCode::BAD_REQUEST, body, &signatures()).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn other_search_errors_are_terminal() {
        let body = r#"{"code":14,"message":"Invalid OAuth token."}"#;

        let err =
            parse_contact_search(StatusCode::UNAUTHORIZED, body, &signatures()).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    // =========================================================================
    // Contact create
    // =========================================================================

    #[test]
    fn create_returns_new_contact_id() {
        let body = r#"{"contact":{"contact_id":"cust_9"}}"#;

        let id = parse_contact_create(StatusCode::CREATED, body, &signatures()).unwrap();
        assert_eq!(id.as_str(), "cust_9");
    }

    #[test]
    fn duplicate_code_maps_to_duplicate_customer() {
        let body = r#"{"code":3062,"message":"Contact already exists."}"#;

        let err = parse_contact_create(StatusCode::BAD_REQUEST, body, &signatures()).unwrap_err();
        assert!(matches!(err, AppError::DuplicateCustomer));
    }

    #[test]
    fn create_success_without_id_is_a_reconciliation_failure() {
        let body = r#"{"contact":{}}"#;

        let err = parse_contact_create(StatusCode::OK, body, &signatures()).unwrap_err();
        assert!(matches!(err, AppError::CustomerReconciliation(_)));
    }

    // =========================================================================
    // Invoice create
    // =========================================================================

    #[test]
    fn invoice_create_returns_id() {
        let body = r#"{"invoice":{"invoice_id":"inv_1","invoice_number":"INV-001"}}"#;

        let id = parse_invoice_create(StatusCode::CREATED, body).unwrap();
        assert_eq!(id.as_str(), "inv_1");
    }

    #[test]
    fn invoice_2xx_without_id_is_a_failure() {
        let body = r#"{"message":"The invoice has been created.","invoice":{}}"#;

        let err = parse_invoice_create(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, AppError::InvoiceCreation(_)));
    }

    #[test]
    fn invoice_http_error_is_a_failure() {
        let body = r#"{"code":5,"message":"Invalid value for rate."}"#;

        let err = parse_invoice_create(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(matches!(err, AppError::InvoiceCreation(_)));
    }
}
