//! String-returning quote lookups for the chat command layer.
//!
//! [`QuoteService`] is the only type the command dispatcher talks to. It
//! owns the catalog, the ticker cache and the stats aggregator and formats
//! every value as locale-neutral, two-decimal fixed point.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::Result;
use crate::cache::{Clock, ProductCatalog, TickerCache, system_clock};
use crate::client::MarketData;
use crate::config::CacheConfig;
use crate::models::stats::Stats;
use crate::stats::StatsAggregator;

/// Upper bound on concurrent ticker lookups issued by
/// [`QuoteService::all_prices`]. The public API rate-limits per client.
pub const MAX_CONCURRENT_LOOKUPS: usize = 4;

/// Front door for price, volume, catalog and stats queries.
pub struct QuoteService {
    catalog: ProductCatalog,
    tickers: Arc<TickerCache>,
    stats: StatsAggregator,
}

impl QuoteService {
    pub fn new(
        source: Arc<dyn MarketData>,
        quote_currency: impl Into<String>,
        cache: CacheConfig,
    ) -> Self {
        Self::with_clock(source, quote_currency, cache, system_clock())
    }

    pub fn with_clock(
        source: Arc<dyn MarketData>,
        quote_currency: impl Into<String>,
        cache: CacheConfig,
        clock: Clock,
    ) -> Self {
        let tickers = Arc::new(TickerCache::with_clock(Arc::clone(&source), cache, clock));
        Self {
            catalog: ProductCatalog::new(Arc::clone(&source), quote_currency),
            stats: StatsAggregator::new(source, Arc::clone(&tickers)),
            tickers,
        }
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn tickers(&self) -> &TickerCache {
        &self.tickers
    }

    /// Last trade price, e.g. `"$50000.00"`.
    ///
    /// # Errors
    ///
    /// Returns the ticker lookup error.
    pub async fn price(&self, product_id: &str) -> Result<String> {
        let ticker = self.tickers.get_ticker(product_id).await?;
        Ok(format!("${}", fixed(ticker.price())))
    }

    /// 24h volume, e.g. `"10.50"`.
    ///
    /// # Errors
    ///
    /// Returns the ticker lookup error.
    pub async fn volume(&self, product_id: &str) -> Result<String> {
        let ticker = self.tickers.get_ticker(product_id).await?;
        Ok(fixed(ticker.volume()))
    }

    /// Display names of every catalog product, comma separated.
    ///
    /// An unavailable catalog yields an empty string.
    pub async fn list_products(&self) -> String {
        match self.catalog.get_products().await {
            Ok(products) => products
                .iter()
                .map(|p| p.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Err(_) => String::new(),
        }
    }

    /// `"<base> $<price>"` for every catalog product, in catalog order.
    ///
    /// At most [`MAX_CONCURRENT_LOOKUPS`] ticker lookups are in flight at
    /// once. Products whose lookup fails are left out; this never fails.
    pub async fn all_prices(&self) -> String {
        let Ok(products) = self.catalog.get_products().await else {
            return String::new();
        };

        let results: Vec<_> = stream::iter(products.iter())
            .map(|p| self.tickers.get_ticker(&p.id))
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        products
            .iter()
            .zip(results)
            .filter_map(|(product, result)| match result {
                Ok(ticker) => Some(format!(
                    "{} ${}",
                    product.base_currency,
                    fixed(ticker.price())
                )),
                Err(e) => {
                    warn!(product = %product.id, error = %e, "skipping product in price listing");
                    None
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Price with the day's range and change, e.g.
    /// `"BTC-USD $51000.00 open 50000.00 high 52000.00 low 49000.00 change +2.00%"`.
    ///
    /// # Errors
    ///
    /// Returns the ticker or daily stats lookup error.
    pub async fn stats(&self, product_id: &str) -> Result<String> {
        let stats = self.stats.get_stats(product_id).await?;
        Ok(format_stats(product_id, &stats))
    }

    /// Drops the cached catalog; the next listing refetches it.
    pub async fn invalidate_catalog(&self) {
        self.catalog.invalidate().await;
    }
}

fn format_stats(product_id: &str, stats: &Stats) -> String {
    let change = match stats.change_percent {
        Some(pct) if pct.is_sign_positive() && !pct.is_zero() => format!("+{}%", fixed(pct)),
        Some(pct) => format!("{}%", fixed(pct)),
        None => "n/a".to_string(),
    };
    format!(
        "{product_id} ${} open {} high {} low {} change {change}",
        fixed(stats.ticker.price()),
        fixed(stats.open),
        fixed(stats.high),
        fixed(stats.low),
    )
}

/// Two-decimal fixed point, rounding half away from zero.
///
/// Values with too many integer digits to carry a scale of 2 in a
/// `Decimal` are padded with zeros as text.
pub fn fixed(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    let text = rounded.to_string();
    match rounded.scale() {
        0 => format!("{text}.00"),
        1 => format!("{text}0"),
        _ => text,
    }
}
