// src/services/quotes.rs
use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::cache::Cache;
use super::market_hours::is_market_open_now;
use crate::models::Sourced;
use crate::BoxError;

/// Anything that can report the current market price of a Yahoo symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn latest_price(&self, symbol: &str) -> Result<f64, BoxError>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

/// Reads `regularMarketPrice` from the Yahoo Finance chart endpoint.
pub struct YahooQuoteProvider {
    client: Client,
    base_url: String,
}

impl YahooQuoteProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://query1.finance.yahoo.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        YahooQuoteProvider {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    async fn latest_price(&self, symbol: &str) -> Result<f64, BoxError> {
        let url = format!("{}/v8/finance/chart/{}?interval=1d&range=1d", self.base_url, symbol);
        let body: ChartResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_chart_price(body).ok_or_else(|| format!("No price data for {}", symbol).into())
    }
}

fn parse_chart_price(body: ChartResponse) -> Option<f64> {
    body.chart
        .result?
        .into_iter()
        .next()?
        .meta
        .regular_market_price
        .filter(|price| price.is_finite() && *price != 0.0)
}

pub struct QuoteFetcher {
    provider: Arc<dyn QuoteProvider>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
    only_when_market_open: bool,
    market_open: fn() -> bool,
}

impl QuoteFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        QuoteFetcher {
            provider,
            cache,
            ttl,
            only_when_market_open: false,
            market_open: is_market_open_now,
        }
    }

    /// Serve the static price instead of a live quote while NSE is closed.
    pub fn only_when_market_open(mut self, enabled: bool) -> Self {
        self.only_when_market_open = enabled;
        self
    }

    pub fn with_market_clock(mut self, market_open: fn() -> bool) -> Self {
        self.market_open = market_open;
        self
    }

    /// Current market price for `symbol`, or `static_cmp` when no live or cached
    /// price can be had. Never fails.
    pub async fn fetch_cmp(&self, symbol: &str, static_cmp: Option<f64>) -> Sourced<Option<f64>> {
        let cache_key = format!("cmp:{}", symbol);
        if let Some(cached) = self.cache.get(&cache_key).await {
            match cached.parse::<f64>() {
                Ok(price) => return Sourced::Cached(Some(price)),
                Err(_) => warn!("Ignoring unparseable cached CMP '{}' for {}", cached, symbol),
            }
        }

        if self.only_when_market_open && !(self.market_open)() {
            warn!("Market is closed. Using static CMP ({:?}) for {}", static_cmp, symbol);
            return Sourced::Fallback(static_cmp);
        }

        match self.provider.latest_price(symbol).await {
            Ok(price) => {
                self.cache.set(&cache_key, &price.to_string(), self.ttl).await;
                info!("Fetched CMP for {}: {}", symbol, price);
                Sourced::Live(Some(price))
            }
            Err(e) => {
                error!("Error fetching CMP for {}: {}", symbol, e);
                warn!("Using static CMP ({:?}) for {}", static_cmp, symbol);
                Sourced::Fallback(static_cmp)
            }
        }
    }
}
