//! Fetch-once catalog of tradable products.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::Result;
use crate::client::MarketData;
use crate::models::product::Product;

/// Products quoted in a single target currency, sorted by id.
///
/// The list is fetched on first use and kept for the life of the catalog.
/// Upstream changes are not picked up until [`invalidate`](Self::invalidate)
/// is called. A failed fetch leaves the catalog empty so the next call
/// tries again.
pub struct ProductCatalog {
    source: Arc<dyn MarketData>,
    quote_currency: String,
    // Held across the fetch so concurrent first callers share one request.
    products: Mutex<Option<Arc<[Product]>>>,
}

impl ProductCatalog {
    pub fn new(source: Arc<dyn MarketData>, quote_currency: impl Into<String>) -> Self {
        Self {
            source,
            quote_currency: quote_currency.into(),
            products: Mutex::new(None),
        }
    }

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }

    /// Returns the cached product list, fetching it on first call.
    ///
    /// # Errors
    ///
    /// Propagates the [`MarketData::list_products`] error when the catalog
    /// has not been populated yet and the fetch fails.
    pub async fn get_products(&self) -> Result<Arc<[Product]>> {
        let mut slot = self.products.lock().await;
        if let Some(products) = slot.as_ref() {
            return Ok(Arc::clone(products));
        }

        let mut products: Vec<Product> = match self.source.list_products().await {
            Ok(all) => all
                .into_iter()
                .filter(|p| p.is_quoted_in(&self.quote_currency))
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to load product catalog");
                return Err(e);
            }
        };
        products.sort_by(|a, b| a.id.cmp(&b.id));

        info!(
            count = products.len(),
            quote = %self.quote_currency,
            "loaded product catalog"
        );
        let products: Arc<[Product]> = products.into();
        *slot = Some(Arc::clone(&products));
        Ok(products)
    }

    /// Drops the cached list so the next [`get_products`](Self::get_products)
    /// refetches it.
    pub async fn invalidate(&self) {
        self.products.lock().await.take();
    }

    /// Returns `true` once a fetch has succeeded and not been invalidated.
    pub async fn is_loaded(&self) -> bool {
        self.products.lock().await.is_some()
    }
}
