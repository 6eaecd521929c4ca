//! Product catalog models (`GET /products`).

use serde::{Deserialize, Serialize};

/// A tradable currency pair such as `BTC-USD`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Product {
    /// Exchange symbol, e.g. `"BTC-USD"`.
    pub id: String,
    #[serde(default)]
    pub base_currency: String,
    #[serde(default)]
    pub quote_currency: String,
    /// Human-readable name, e.g. `"BTC/USD"`.
    #[serde(default)]
    pub display_name: String,
}

impl Product {
    /// Returns `true` if the product is quoted in `currency`.
    pub fn is_quoted_in(&self, currency: &str) -> bool {
        self.quote_currency.eq_ignore_ascii_case(currency)
    }
}
