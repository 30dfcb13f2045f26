// src/services/holdings.rs
use anyhow::{bail, Context, Result};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::Holding;

/// Where the static holding list comes from.
#[derive(Debug, Clone)]
pub enum HoldingSource {
    /// JSON array on disk, re-read on every request.
    File(PathBuf),
    Fixed(Arc<Vec<Holding>>),
}

impl HoldingSource {
    pub async fn load(&self) -> Result<Vec<Holding>> {
        let holdings = match self {
            HoldingSource::File(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading holdings from {}", path.display()))?;
                let holdings: Vec<Holding> = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing holdings in {}", path.display()))?;
                debug!("Loaded {} holdings from {}", holdings.len(), path.display());
                holdings
            }
            HoldingSource::Fixed(holdings) => holdings.to_vec(),
        };
        validate_holdings(&holdings)?;
        Ok(holdings)
    }
}

pub fn validate_holdings(holdings: &[Holding]) -> Result<()> {
    for (i, h) in holdings.iter().enumerate() {
        if h.yahoo_symbol.trim().is_empty() {
            bail!("holding #{} has an empty yahooSymbol", i);
        }
        if h.sector.trim().is_empty() {
            bail!("holding {} has an empty sector", h.yahoo_symbol);
        }
        if !h.quantity.is_finite() || h.quantity < 0.0 {
            bail!("holding {} has invalid quantity {}", h.yahoo_symbol, h.quantity);
        }
        if !h.investment.is_finite() {
            bail!("holding {} has invalid investment {}", h.yahoo_symbol, h.investment);
        }
    }
    Ok(())
}
