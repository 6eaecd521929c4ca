//! Combines a live ticker with the day's range.

use std::sync::Arc;

use tracing::warn;

use crate::Result;
use crate::cache::TickerCache;
use crate::client::MarketData;
use crate::models::stats::Stats;

/// Produces [`Stats`] for a product.
///
/// The ticker goes through the shared [`TickerCache`] and its staleness
/// policy. Daily stats are never cached and cost one request per call.
pub struct StatsAggregator {
    source: Arc<dyn MarketData>,
    tickers: Arc<TickerCache>,
}

impl StatsAggregator {
    pub fn new(source: Arc<dyn MarketData>, tickers: Arc<TickerCache>) -> Self {
        Self { source, tickers }
    }

    /// # Errors
    ///
    /// Returns the first upstream error from either the ticker lookup or
    /// the daily stats fetch.
    pub async fn get_stats(&self, product_id: &str) -> Result<Stats> {
        let ticker = self.tickers.get_ticker(product_id).await?;
        let daily = self.source.fetch_daily_stats(product_id).await?;

        let stats = Stats::combine(ticker, daily);
        if stats.change_percent.is_none() {
            warn!(product = product_id, open = %stats.open, "change percent unavailable");
        }
        Ok(stats)
    }
}
