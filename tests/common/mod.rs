//! Shared test utilities: an in-memory exchange, a manual clock and a
//! one-shot HTTP server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use quoteline::cache::Clock;
use quoteline::client::MarketData;
use quoteline::models::product::Product;
use quoteline::models::stats::DailyStats;
use quoteline::models::ticker::Ticker;
use quoteline::{QuotelineError, Result};

pub const PRODUCTS_JSON: &str = include_str!("../fixtures/products.json");
pub const TICKER_JSON: &str = include_str!("../fixtures/ticker.json");
pub const TICKER_BAD_VOLUME_JSON: &str = include_str!("../fixtures/ticker_bad_volume.json");
pub const STATS_JSON: &str = include_str!("../fixtures/stats.json");
pub const STATS_ZERO_OPEN_JSON: &str = include_str!("../fixtures/stats_zero_open.json");

/// Builds a product the way the exchange describes it.
pub fn product(id: &str) -> Product {
    let (base, quote) = id.split_once('-').unwrap();
    Product {
        id: id.to_string(),
        base_currency: base.to_string(),
        quote_currency: quote.to_string(),
        display_name: format!("{base}/{quote}"),
    }
}

fn unavailable(what: &str) -> QuotelineError {
    QuotelineError::Status {
        url: format!("fake://{what}"),
        status: 503,
    }
}

/// In-memory [`MarketData`] that counts every call.
///
/// A missing product list, ticker or daily stats entry makes the matching
/// call fail with a 503 status error.
#[derive(Default)]
pub struct FakeExchange {
    products: Mutex<Option<Vec<Product>>>,
    tickers: Mutex<HashMap<String, Ticker>>,
    daily: Mutex<HashMap<String, DailyStats>>,
    ticker_delay: Mutex<Option<Duration>>,
    product_calls: AtomicUsize,
    ticker_calls: Mutex<HashMap<String, usize>>,
    tickers_in_flight: AtomicUsize,
    max_tickers_in_flight: AtomicUsize,
    stats_calls: AtomicUsize,
}

impl FakeExchange {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_products(&self, products: Option<Vec<Product>>) {
        *self.products.lock().unwrap() = products;
    }

    pub fn set_ticker(&self, product_id: &str, ticker: Option<Ticker>) {
        let mut tickers = self.tickers.lock().unwrap();
        match ticker {
            Some(t) => tickers.insert(product_id.to_string(), t),
            None => tickers.remove(product_id),
        };
    }

    pub fn set_daily(&self, product_id: &str, daily: DailyStats) {
        self.daily
            .lock()
            .unwrap()
            .insert(product_id.to_string(), daily);
    }

    /// Makes every ticker fetch sleep first so concurrent callers overlap.
    pub fn set_ticker_delay(&self, delay: Duration) {
        *self.ticker_delay.lock().unwrap() = Some(delay);
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn ticker_calls(&self, product_id: &str) -> usize {
        self.ticker_calls
            .lock()
            .unwrap()
            .get(product_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    /// Highest number of ticker fetches that were running at the same time.
    pub fn max_tickers_in_flight(&self) -> usize {
        self.max_tickers_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketData for FakeExchange {
    async fn list_products(&self) -> Result<Vec<Product>> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        self.products
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| unavailable("products"))
    }

    async fn fetch_ticker(&self, product_id: &str) -> Result<Ticker> {
        *self
            .ticker_calls
            .lock()
            .unwrap()
            .entry(product_id.to_string())
            .or_default() += 1;

        let running = self.tickers_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_tickers_in_flight.fetch_max(running, Ordering::SeqCst);
        let delay = *self.ticker_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.tickers_in_flight.fetch_sub(1, Ordering::SeqCst);

        self.tickers
            .lock()
            .unwrap()
            .get(product_id)
            .copied()
            .ok_or_else(|| unavailable(product_id))
    }

    async fn fetch_daily_stats(&self, product_id: &str) -> Result<DailyStats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.daily
            .lock()
            .unwrap()
            .get(product_id)
            .copied()
            .ok_or_else(|| unavailable(product_id))
    }
}

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// 2024-01-01T00:00:00Z, the trade time used by the fixtures.
    pub fn at_fixture_time() -> Self {
        Self::starting_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    pub fn advance(&self, secs: i64) {
        *self.now.lock().unwrap() += TimeDelta::seconds(secs);
    }

    pub fn as_clock(&self) -> Clock {
        let now = Arc::clone(&self.now);
        Arc::new(move || *now.lock().unwrap())
    }
}

/// Serves a single canned HTTP response on a local port and returns the
/// base URL to reach it.
pub async fn serve_once(status_line: &str, body: &str) -> String {
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    serve_raw(response).await
}

/// Serves `response` verbatim to the first connection.
pub async fn serve_raw(response: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    format!("http://{addr}")
}

/// Returns a base URL on a port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
