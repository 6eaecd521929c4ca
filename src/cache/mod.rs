//! In-memory market-data caches.
//!
//! Both caches own their state and are handed their [`MarketData`] source
//! at construction; nothing here is global. They are safe to share behind
//! an `Arc` across concurrent callers.
//!
//! [`MarketData`]: crate::client::MarketData

pub mod catalog;
pub mod ticker;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use catalog::ProductCatalog;
pub use ticker::{CachedTicker, TickerCache};

/// Source of "now" for staleness checks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}
