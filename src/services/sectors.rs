// src/services/sectors.rs
use std::collections::BTreeMap;

use crate::models::{EnrichedHolding, SectorSummary};

pub fn calculate_sector_summaries(holdings: &[EnrichedHolding]) -> BTreeMap<String, SectorSummary> {
    holdings.iter().fold(BTreeMap::new(), |mut acc, stock| {
        let summary: &mut SectorSummary = acc.entry(stock.holding.sector.clone()).or_default();
        summary.total_investment += stock.holding.investment;
        summary.total_present_value += stock.present_value;
        summary.total_gain_loss += stock.gain_loss;
        summary.total_market_cap += stock.holding.market_cap.unwrap_or(0.0);
        summary.total_revenue_ttm += stock.holding.revenue_ttm.unwrap_or(0.0);
        summary.total_ebitda_ttm += stock.holding.ebitda_ttm.unwrap_or(0.0);
        summary.total_pat += stock.holding.pat.unwrap_or(0.0);
        acc
    })
}
