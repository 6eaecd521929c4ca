//! Crate-level error types.
//!
//! [`QuotelineError`] unifies every failure a quote lookup can hit
//! (configuration, transport, HTTP status, body read, JSON decode) behind
//! a single enum so callers can match on the variant they care about while
//! still using `?` for propagation.
//!
//! Individual numeric or time fields that fail to parse are *not* errors;
//! see [`Lenient`](crate::models::Lenient).

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QuotelineError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum QuotelineError {
    /// An environment variable held an invalid value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The exchange answered with a non-success status code.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read to completion.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The response body was not the JSON envelope we expected.
    #[error("json error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading console input failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
