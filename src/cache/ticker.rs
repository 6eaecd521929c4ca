//! Per-product ticker cache with a pull-based staleness check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex as SlotMutex;
use tracing::{debug, warn};

use super::{Clock, system_clock};
use crate::Result;
use crate::client::MarketData;
use crate::config::{CacheConfig, StalenessAnchor};
use crate::models::ticker::Ticker;

/// A cached ticker and the local time it was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedTicker {
    pub ticker: Ticker,
    pub fetched_at: DateTime<Utc>,
}

type Slot = Arc<SlotMutex<Option<CachedTicker>>>;

/// Holds at most one ticker per product id.
///
/// A lookup returns the cached ticker while its age is under the
/// configured threshold and refetches otherwise. A successful refetch
/// replaces the entry; a failed one returns the error and leaves the old
/// entry in place.
///
/// Each product id has its own async lock, held for the duration of a
/// refresh, so concurrent lookups for the same id issue at most one
/// upstream request. Lookups for different ids never wait on each other.
pub struct TickerCache {
    source: Arc<dyn MarketData>,
    max_age: TimeDelta,
    anchor: StalenessAnchor,
    slots: Mutex<HashMap<String, Slot>>,
    clock: Clock,
}

impl TickerCache {
    pub fn new(source: Arc<dyn MarketData>, config: CacheConfig) -> Self {
        Self::with_clock(source, config, system_clock())
    }

    /// Builds a cache that reads the current time from `clock`.
    pub fn with_clock(source: Arc<dyn MarketData>, config: CacheConfig, clock: Clock) -> Self {
        Self {
            source,
            max_age: TimeDelta::from_std(config.max_ticker_age).unwrap_or(TimeDelta::MAX),
            anchor: config.anchor,
            slots: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the freshest available ticker for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns the upstream error when a fetch is needed and fails. Any
    /// previously cached ticker is kept; an id that has never been fetched
    /// successfully leaves nothing behind.
    pub async fn get_ticker(&self, product_id: &str) -> Result<Ticker> {
        let slot = self.slot(product_id);
        let result = self.refresh(product_id, &slot).await;
        if result.is_err() {
            self.release_empty(product_id, slot);
        }
        result
    }

    async fn refresh(&self, product_id: &str, slot: &Slot) -> Result<Ticker> {
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            let age = self.age(cached);
            if age < self.max_age {
                debug!(product = product_id, age_secs = age.num_seconds(), "ticker cache hit");
                return Ok(cached.ticker);
            }
            debug!(product = product_id, age_secs = age.num_seconds(), "ticker is stale");
        }

        match self.source.fetch_ticker(product_id).await {
            Ok(ticker) => {
                *entry = Some(CachedTicker {
                    ticker,
                    fetched_at: (self.clock)(),
                });
                Ok(ticker)
            }
            Err(e) => {
                warn!(
                    product = product_id,
                    error = %e,
                    kept_stale = entry.is_some(),
                    "ticker refresh failed"
                );
                Err(e)
            }
        }
    }

    /// Drops the slot for `product_id` if it never held a ticker and no
    /// other lookup is holding or waiting on it.
    ///
    /// Runs under the map lock, so no new lookup can pick up the slot
    /// between the check and the removal.
    fn release_empty(&self, product_id: &str, slot: Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = slots.get(product_id) else {
            return;
        };
        // One reference in the map, one held here.
        if !Arc::ptr_eq(current, &slot) || Arc::strong_count(&slot) > 2 {
            return;
        }
        if slot.try_lock().is_ok_and(|entry| entry.is_none()) {
            slots.remove(product_id);
            debug!(product = product_id, "dropped empty ticker slot");
        }
    }

    /// Returns the last successfully fetched ticker without any network
    /// access, however old it is.
    pub async fn peek(&self, product_id: &str) -> Option<CachedTicker> {
        let slot = self.existing_slot(product_id)?;
        let entry = slot.lock().await;
        *entry
    }

    /// Number of product ids with a slot. Ids whose lookups have all
    /// failed are not counted once those lookups return.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn age(&self, cached: &CachedTicker) -> TimeDelta {
        let now = (self.clock)();
        match self.anchor {
            StalenessAnchor::TradeTime => cached.ticker.age(now),
            StalenessAnchor::FetchTime => now - cached.fetched_at,
        }
    }

    fn slot(&self, product_id: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(product_id.to_string()).or_default())
    }

    fn existing_slot(&self, product_id: &str) -> Option<Slot> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(product_id)
            .cloned()
    }
}
