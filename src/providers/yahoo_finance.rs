use super::util::with_retry;
use crate::core::config::YahooProviderConfig;
use crate::core::price::{PriceProvider, PriceQuote};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const RETRY_DELAY_MS: u64 = 500;

// YahooFinanceProvider implementation for PriceProvider
pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
}

impl YahooFinanceProvider {
    pub fn new(config: &YahooProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("folio/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(YahooFinanceProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            retries: config.retries,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
    #[serde(alias = "shortName")]
    short_name: Option<String>,
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooPriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<PriceQuote> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!("Requesting price data from {}", url);

        let response = with_retry(
            || self.client.get(&url).send(),
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooPriceResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let meta = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .map(|item| item.meta)
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let price = meta
            .regular_market_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| anyhow!("No trading price for symbol: {}", symbol))?;

        Ok(PriceQuote {
            price,
            currency: meta.currency.unwrap_or_else(|| "USD".to_string()),
            short_name: meta.short_name,
        })
    }
}
