//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub currency: String,
    pub short_name: Option<String>,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote>;
}

/// Last known price per ticker. `None` means no usable price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceMap(BTreeMap<String, Option<f64>>);

impl PriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a price for `ticker`. Zero, negative and non-finite prices are
    /// stored as unavailable.
    pub fn insert(&mut self, ticker: impl Into<String>, price: Option<f64>) {
        let price = price.filter(|p| p.is_finite() && *p > 0.0);
        self.0.insert(ticker.into(), price);
    }

    /// Usable price for `ticker`, if any.
    pub fn price(&self, ticker: &str) -> Option<f64> {
        self.0.get(ticker).copied().flatten()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains_key(ticker)
    }

    /// Tickers that were requested but have no usable price.
    pub fn unavailable(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, price)| price.is_none())
            .map(|(ticker, _)| ticker.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.0.iter().map(|(ticker, price)| (ticker.as_str(), *price))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Option<f64>)> for PriceMap {
    fn from_iter<I: IntoIterator<Item = (S, Option<f64>)>>(iter: I) -> Self {
        let mut map = PriceMap::new();
        for (ticker, price) in iter {
            map.insert(ticker, price);
        }
        map
    }
}

/// Fetches every ticker concurrently and folds the outcomes into a [`PriceMap`].
///
/// A failed lookup only marks its own ticker as unavailable. `on_fetched` is
/// called once per ticker as results arrive.
pub async fn fetch_prices(
    provider: &(dyn PriceProvider + Send + Sync),
    tickers: &[String],
    on_fetched: &(dyn Fn() + Send + Sync),
) -> PriceMap {
    let price_futures = tickers.iter().map(|ticker| async move {
        let res = provider.fetch_price(ticker).await;
        on_fetched();
        (ticker.clone(), res)
    });

    join_all(price_futures)
        .await
        .into_iter()
        .map(|(ticker, res)| match res {
            Ok(quote) => {
                debug!(%ticker, price = quote.price, currency = %quote.currency, "Fetched price");
                (ticker, Some(quote.price))
            }
            Err(e) => {
                warn!(%ticker, error = %e, "Price unavailable");
                (ticker, None)
            }
        })
        .collect()
}
