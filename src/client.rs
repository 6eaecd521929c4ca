//! Stateless REST client for the exchange's public market-data endpoints.
//!
//! Each call issues exactly one `GET` and decodes the JSON body. There is
//! no caching and no retry here; transient failures are returned to the
//! caller so they can be logged. Caching lives in [`crate::cache`].

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ExchangeConfig;
use crate::error::QuotelineError;
use crate::models::product::Product;
use crate::models::stats::{DailyStats, RawDailyStats};
use crate::models::ticker::{RawTicker, Ticker};
use crate::Result;

/// Source of market data consumed by the cache layer.
///
/// [`RestClient`] is the production implementation; tests substitute
/// in-memory doubles.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Returns every product on the exchange, unfiltered.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Returns the latest trade snapshot for `product_id`.
    async fn fetch_ticker(&self, product_id: &str) -> Result<Ticker>;

    /// Returns the day's open/high/low for `product_id`.
    async fn fetch_daily_stats(&self, product_id: &str) -> Result<DailyStats>;
}

/// HTTP+JSON client for the exchange REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Builds a client for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`QuotelineError::Config`] if the base URL cannot be parsed
    /// or the HTTP client cannot be constructed.
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url).map_err(|e| {
            QuotelineError::Config(format!("invalid api url `{}`: {e}", config.api_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(QuotelineError::Config(format!(
                "api url `{}` cannot be used as a base",
                config.api_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| QuotelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Appends path segments to the base URL, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(QuotelineError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuotelineError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(QuotelineError::Body)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl MarketData for RestClient {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let products: Vec<Product> = self.get_json(self.endpoint(&["products"])).await?;
        debug!(count = products.len(), "fetched product list");
        Ok(products)
    }

    async fn fetch_ticker(&self, product_id: &str) -> Result<Ticker> {
        let raw: RawTicker = self
            .get_json(self.endpoint(&["products", product_id, "ticker"]))
            .await?;
        let ticker = Ticker::from(raw);

        let defaulted = ticker.defaulted_fields();
        if !defaulted.is_empty() {
            warn!(product = product_id, fields = ?defaulted, "ticker fields defaulted");
        }
        Ok(ticker)
    }

    async fn fetch_daily_stats(&self, product_id: &str) -> Result<DailyStats> {
        let raw: RawDailyStats = self
            .get_json(self.endpoint(&["products", product_id, "stats"]))
            .await?;
        let stats = DailyStats::from(raw);

        let defaulted = stats.defaulted_fields();
        if !defaulted.is_empty() {
            warn!(product = product_id, fields = ?defaulted, "daily stats fields defaulted");
        }
        Ok(stats)
    }
}
