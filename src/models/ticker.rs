//! Ticker models (`GET /products/{id}/ticker`).

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::Lenient;

/// Ticker body as sent by the exchange, before lenient field parsing.
///
/// Fields stay untyped so one malformed value cannot reject the envelope.
#[derive(Debug, Deserialize)]
pub struct RawTicker {
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub volume: Option<serde_json::Value>,
    #[serde(default)]
    pub time: Option<serde_json::Value>,
}

/// Last-trade snapshot for a product.
///
/// `trade_time` is the moment the exchange reports for the last trade,
/// not the moment this process fetched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    pub price: Lenient<Decimal>,
    pub volume: Lenient<Decimal>,
    pub trade_time: Lenient<DateTime<Utc>>,
}

impl Ticker {
    /// Builds a ticker from already-validated values.
    pub fn new(price: Decimal, volume: Decimal, trade_time: DateTime<Utc>) -> Self {
        Self {
            price: Lenient::Parsed(price),
            volume: Lenient::Parsed(volume),
            trade_time: Lenient::Parsed(trade_time),
        }
    }

    pub fn price(&self) -> Decimal {
        self.price.value()
    }

    pub fn volume(&self) -> Decimal {
        self.volume.value()
    }

    pub fn trade_time(&self) -> DateTime<Utc> {
        self.trade_time.value()
    }

    /// Time elapsed between the last trade and `now`.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.trade_time()
    }

    /// Names of the fields that fell back to their default.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.price.is_defaulted() {
            fields.push("price");
        }
        if self.volume.is_defaulted() {
            fields.push("volume");
        }
        if self.trade_time.is_defaulted() {
            fields.push("time");
        }
        fields
    }
}

impl From<RawTicker> for Ticker {
    fn from(raw: RawTicker) -> Self {
        Self {
            price: Lenient::decimal(raw.price.as_ref()),
            volume: Lenient::decimal(raw.volume.as_ref()),
            trade_time: Lenient::trade_time(raw.time.as_ref()),
        }
    }
}
