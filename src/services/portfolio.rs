// src/services/portfolio.rs
use anyhow::Result;
use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;

use super::holdings::HoldingSource;
use super::quotes::QuoteFetcher;
use super::sectors::calculate_sector_summaries;
use super::ticker::to_google_finance_ticker;
use super::valuation::ValuationScraper;
use crate::models::{EnrichedHolding, Holding, PortfolioResponse, Valuation};

pub struct PortfolioService {
    holdings: HoldingSource,
    quotes: QuoteFetcher,
    valuations: ValuationScraper,
}

impl PortfolioService {
    pub fn new(holdings: HoldingSource, quotes: QuoteFetcher, valuations: ValuationScraper) -> Self {
        PortfolioService {
            holdings,
            quotes,
            valuations,
        }
    }

    /// Enriches every holding and summarises by sector. Only a bad holding
    /// list fails; upstream trouble degrades individual holdings instead.
    pub async fn get_portfolio(&self) -> Result<PortfolioResponse> {
        let holdings = self.holdings.load().await?;
        let portfolio = self.enrich_all(holdings).await;
        let sectors = calculate_sector_summaries(&portfolio);

        Ok(PortfolioResponse { portfolio, sectors })
    }

    pub async fn enrich_all(&self, holdings: Vec<Holding>) -> Vec<EnrichedHolding> {
        let total = holdings.len();
        let results = join_all(holdings.into_iter().map(|h| self.enrich(h))).await;

        let degraded = results.iter().filter(|(_, degraded)| *degraded).count();
        if degraded > 0 {
            warn!("{} of {} holdings served with fallback data", degraded, total);
        } else {
            info!("Enriched {} holdings", total);
        }

        results.into_iter().map(|(enriched, _)| enriched).collect()
    }

    async fn enrich(&self, holding: Holding) -> (EnrichedHolding, bool) {
        let google_ticker = to_google_finance_ticker(&holding.yahoo_symbol);
        let (cmp, valuation) = tokio::join!(
            self.quotes.fetch_cmp(&holding.yahoo_symbol, holding.static_cmp),
            self.valuations.scrape(&google_ticker),
        );

        let degraded = cmp.is_fallback() || valuation.is_fallback();
        (build_enriched(holding, cmp.into_value(), valuation.into_value()), degraded)
    }
}

pub fn build_enriched(holding: Holding, cmp: Option<f64>, valuation: Valuation) -> EnrichedHolding {
    let present_value = present_value(&holding, cmp);
    let gain_loss = present_value - holding.investment;
    let gain_loss_percentage = if holding.investment != 0.0 {
        gain_loss / holding.investment * 100.0
    } else {
        0.0
    };

    EnrichedHolding {
        symbol: holding.exchange.clone(),
        holding,
        cmp,
        pe_ratio: valuation.pe_ratio,
        latest_earnings: valuation.latest_earnings,
        present_value,
        gain_loss,
        gain_loss_percentage,
    }
}

/// Sold positions are valued at the sale price; everything else at the
/// live price, then the static price, then zero.
fn present_value(holding: &Holding, cmp: Option<f64>) -> f64 {
    let nonzero = |p: &f64| *p != 0.0;
    if let Some(sale_price) = holding.sale_price.filter(nonzero) {
        return sale_price * holding.quantity;
    }
    let price = cmp
        .filter(nonzero)
        .or(holding.static_cmp.filter(nonzero))
        .unwrap_or(0.0);
    price * holding.quantity
}
