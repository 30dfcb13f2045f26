// src/models.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of the static portfolio, as read from the holdings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(default)]
    pub particulars: String,
    pub yahoo_symbol: String,
    /// Display code shown to the client (NSE symbol or BSE scrip code).
    pub exchange: String,
    pub sector: String,
    #[serde(default)]
    pub purchase_price: f64,
    pub quantity: f64,
    pub investment: f64,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(rename = "staticCMP", default)]
    pub static_cmp: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(rename = "revenueTTM", default)]
    pub revenue_ttm: Option<f64>,
    #[serde(rename = "ebitdaTTM", default)]
    pub ebitda_ttm: Option<f64>,
    #[serde(default)]
    pub pat: Option<f64>,
}

pub const NOT_AVAILABLE: &str = "N/A";
pub const FETCH_ERROR: &str = "Error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub pe_ratio: String,
    pub latest_earnings: String,
}

impl Valuation {
    pub fn not_available() -> Self {
        Valuation {
            pe_ratio: NOT_AVAILABLE.to_string(),
            latest_earnings: NOT_AVAILABLE.to_string(),
        }
    }

    pub fn error() -> Self {
        Valuation {
            pe_ratio: FETCH_ERROR.to_string(),
            latest_earnings: FETCH_ERROR.to_string(),
        }
    }
}

/// Where a value handed back by a fetcher came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Live(T),
    Cached(T),
    Fallback(T),
}

impl<T> Sourced<T> {
    pub fn value(&self) -> &T {
        match self {
            Sourced::Live(v) | Sourced::Cached(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Sourced::Live(v) | Sourced::Cached(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback(_))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedHolding {
    #[serde(flatten)]
    pub holding: Holding,
    pub symbol: String,
    pub cmp: Option<f64>,
    pub pe_ratio: String,
    pub latest_earnings: String,
    pub present_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub total_investment: f64,
    pub total_present_value: f64,
    pub total_gain_loss: f64,
    pub total_market_cap: f64,
    #[serde(rename = "totalRevenueTTM")]
    pub total_revenue_ttm: f64,
    #[serde(rename = "totalEbitdaTTM")]
    pub total_ebitda_ttm: f64,
    pub total_pat: f64,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub portfolio: Vec<EnrichedHolding>,
    pub sectors: BTreeMap<String, SectorSummary>,
}
