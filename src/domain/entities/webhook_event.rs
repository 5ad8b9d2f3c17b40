use chrono::{DateTime, NaiveDate, Utc};

use crate::app_error::{AppError, AppResult};

/// The only Paddle event type this service acts on.
pub const TRANSACTION_COMPLETED: &str = "transaction.completed";

/// A completed Paddle transaction, extracted from the webhook payload.
///
/// The webhook transport guarantees nothing about delivery count, so the same
/// `transaction_id` may arrive more than once.
#[derive(Debug, Clone)]
pub struct TransactionEvent {
    pub transaction_id: String,
    /// Paddle's opaque id for the paying customer (`ctm_...`).
    pub payer_ref: String,
    /// Price id of the first line item (`pri_...`). Transactions carrying
    /// several items are billed by their first item only.
    pub price_ref: String,
    /// Amount in the currency's smallest unit, from `data.payments[0].amount`.
    pub minor_amount: i64,
    pub currency_code: String,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionEvent {
    /// Extract a transaction from the raw Paddle payload.
    ///
    /// Field access is defensive: any missing or unparseable required field
    /// is an error for this event, never a default value.
    pub fn from_payload(payload: &serde_json::Value) -> AppResult<Self> {
        let data = &payload["data"];

        let transaction_id = required_str(data, "id")?;
        let payer_ref = required_str(data, "customer_id")?;
        let currency_code = required_str(data, "currency_code")?;

        let price_ref = data["items"][0]["price"]["id"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::MalformedEvent("missing items[0].price.id".to_string())
            })?
            .to_string();

        // Paddle sends the amount as a string of minor units. A value that
        // does not parse is an explicit error, not a zero amount.
        let raw_amount = data["payments"][0]["amount"].as_str().ok_or_else(|| {
            AppError::MalformedEvent("missing payments[0].amount".to_string())
        })?;
        let minor_amount: i64 = raw_amount.parse().map_err(|_| {
            AppError::MalformedEvent(format!("unparseable amount {raw_amount:?}"))
        })?;
        if minor_amount <= 0 {
            return Err(AppError::MalformedEvent(format!(
                "non-positive amount {minor_amount}"
            )));
        }

        let occurred_at = data["occurred_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Self {
            transaction_id,
            payer_ref,
            price_ref,
            minor_amount,
            currency_code,
            occurred_at,
        })
    }

    /// Amount in display units.
    ///
    /// Assumes a 2-decimal currency. Zero-decimal (JPY) and three-decimal
    /// (BHD) currencies are billed incorrectly by this conversion; the
    /// minor-unit exponent is not looked up per currency yet.
    pub fn display_amount(&self) -> f64 {
        self.minor_amount as f64 / 100.0
    }

    /// Date to stamp on the invoice: the transaction date when Paddle sent
    /// one, otherwise today.
    pub fn invoice_date(&self) -> NaiveDate {
        self.occurred_at
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn required_str(data: &serde_json::Value, field: &str) -> AppResult<String> {
    data[field]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::MalformedEvent(format!("missing data.{field}")))
}
