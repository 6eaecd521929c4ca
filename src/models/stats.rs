//! Daily statistics models (`GET /products/{id}/stats`) and the derived
//! [`Stats`] record.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::Lenient;
use super::ticker::Ticker;

/// Stats body as sent by the exchange, before lenient field parsing.
#[derive(Debug, Deserialize)]
pub struct RawDailyStats {
    #[serde(default)]
    pub open: Option<serde_json::Value>,
    #[serde(default)]
    pub high: Option<serde_json::Value>,
    #[serde(default)]
    pub low: Option<serde_json::Value>,
    #[serde(default)]
    pub volume: Option<serde_json::Value>,
}

/// The day's raw open/high/low range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyStats {
    pub open: Lenient<Decimal>,
    pub high: Lenient<Decimal>,
    pub low: Lenient<Decimal>,
    pub volume: Lenient<Decimal>,
}

impl DailyStats {
    pub fn new(open: Decimal, high: Decimal, low: Decimal, volume: Decimal) -> Self {
        Self {
            open: Lenient::Parsed(open),
            high: Lenient::Parsed(high),
            low: Lenient::Parsed(low),
            volume: Lenient::Parsed(volume),
        }
    }

    /// Names of the fields that fell back to their default.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("volume", self.volume),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_defaulted())
        .map(|(name, _)| name)
        .collect()
    }
}

impl From<RawDailyStats> for DailyStats {
    fn from(raw: RawDailyStats) -> Self {
        Self {
            open: Lenient::decimal(raw.open.as_ref()),
            high: Lenient::decimal(raw.high.as_ref()),
            low: Lenient::decimal(raw.low.as_ref()),
            volume: Lenient::decimal(raw.volume.as_ref()),
        }
    }
}

/// A live ticker combined with the day's range. Computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub ticker: Ticker,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    /// `100 * (price / open - 1)`, or `None` when `open` is zero.
    pub change_percent: Option<Decimal>,
}

impl Stats {
    pub fn combine(ticker: Ticker, daily: DailyStats) -> Self {
        let open = daily.open.value();
        Self {
            ticker,
            open,
            high: daily.high.value(),
            low: daily.low.value(),
            change_percent: change_percent(ticker.price(), open),
        }
    }
}

/// Percentage change from `open` to `price`.
///
/// Returns `None` instead of dividing by zero or overflowing.
pub fn change_percent(price: Decimal, open: Decimal) -> Option<Decimal> {
    let ratio = price.checked_div(open)?;
    ratio
        .checked_sub(Decimal::ONE)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
