use std::collections::HashMap;

use crate::app_error::{AppError, AppResult};

/// Static mapping from a Paddle price id to the Zoho item id it bills as.
///
/// Built once at startup from the `PRICE_PRODUCT_MAP` environment variable
/// (`pri_A=prod_X,pri_B=prod_Y`). A price id without a mapping is a hard stop
/// for that event.
#[derive(Debug, Clone, Default)]
pub struct PriceProductMap {
    entries: HashMap<String, String>,
}

impl PriceProductMap {
    pub fn from_spec(spec: &str) -> Self {
        let mut entries = HashMap::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((price, product)) if !price.is_empty() && !product.is_empty() => {
                    entries.insert(price.trim().to_string(), product.trim().to_string());
                }
                _ => {
                    tracing::warn!(entry = pair, "Skipping malformed price map entry");
                }
            }
        }
        Self { entries }
    }

    pub fn resolve(&self, price_ref: &str) -> AppResult<&str> {
        self.entries
            .get(price_ref)
            .map(String::as_str)
            .ok_or_else(|| AppError::UnknownPriceRef(price_ref.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
