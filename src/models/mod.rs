//! Typed models for the exchange's public REST endpoints.
//!
//! Every numeric field arrives as a JSON string. Values that fail to parse
//! degrade to zero (times to the Unix epoch) instead of failing the whole
//! response; [`Lenient`] records which of the two happened so callers and
//! tests can tell a genuine zero from a defaulted one.

pub mod product;
pub mod stats;
pub mod ticker;

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// Wire format of the trade time once sub-second precision is stripped.
const TRADE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A value decoded from an upstream field under the zero-default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lenient<T> {
    /// The upstream text parsed cleanly.
    Parsed(T),
    /// The field was missing or unparseable; holds the type's default.
    Defaulted(T),
}

impl<T: Copy> Lenient<T> {
    /// Returns the value regardless of how it was obtained.
    pub fn value(&self) -> T {
        match self {
            Self::Parsed(v) | Self::Defaulted(v) => *v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }
}

impl Lenient<Decimal> {
    /// Parses a decimal field, falling back to zero.
    pub fn decimal(raw: Option<&serde_json::Value>) -> Self {
        raw.and_then(field_text)
            .and_then(|text| Decimal::from_str(text.trim()).ok())
            .map_or(Self::Defaulted(Decimal::ZERO), Self::Parsed)
    }
}

impl Lenient<DateTime<Utc>> {
    /// Parses a trade time such as `2024-01-01T00:00:00.123Z`, falling back
    /// to the Unix epoch.
    ///
    /// Everything from the first `.` onward is dropped, as is a bare
    /// trailing `Z`, before parsing as UTC at whole-second precision.
    pub fn trade_time(raw: Option<&serde_json::Value>) -> Self {
        raw.and_then(field_text)
            .and_then(|text| {
                let text = text.trim();
                let whole_seconds = match text.find('.') {
                    Some(ix) => &text[..ix],
                    None => text.trim_end_matches('Z'),
                };
                NaiveDateTime::parse_from_str(whole_seconds, TRADE_TIME_FORMAT).ok()
            })
            .map_or(Self::Defaulted(DateTime::<Utc>::UNIX_EPOCH), |naive| {
                Self::Parsed(naive.and_utc())
            })
    }
}

/// Returns the textual form of a raw field.
///
/// Strings are used as-is. Bare JSON numbers are accepted too since the
/// exchange has been seen to send them on some endpoints.
fn field_text(value: &serde_json::Value) -> Option<Cow<'_, str>> {
    match value {
        serde_json::Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        serde_json::Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}
