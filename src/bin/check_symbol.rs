// src/bin/check_symbol.rs
//
// Runs the live quote fetch and Google Finance scrape for a single symbol,
// bypassing the cache. Useful when the page markup changes.
//
//   cargo run --bin check_symbol -- HDFCBANK.NS 1700
use dotenv::dotenv;
use log::{error, info};
use reqwest::Client;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use portfolio_dashboard::models::Sourced;
use portfolio_dashboard::services::cache::NoCache;
use portfolio_dashboard::services::quotes::{QuoteFetcher, YahooQuoteProvider};
use portfolio_dashboard::services::ticker::to_google_finance_ticker;
use portfolio_dashboard::services::valuation::{GoogleFinancePages, ValuationScraper};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let mut args = env::args().skip(1);
    let symbol = match args.next() {
        Some(symbol) => symbol,
        None => {
            error!("usage: check_symbol <YAHOO_SYMBOL> [STATIC_PRICE]");
            return Err("missing symbol".into());
        }
    };
    let static_cmp = args.next().map(|p| p.parse::<f64>()).transpose()?;

    let http = Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()?;
    let ttl = Duration::from_secs(0);
    let quotes = QuoteFetcher::new(Arc::new(YahooQuoteProvider::new(http.clone())), Arc::new(NoCache), ttl);
    let scraper = ValuationScraper::new(Arc::new(GoogleFinancePages::new(http)), Arc::new(NoCache), ttl);

    let ticker = to_google_finance_ticker(&symbol);
    info!("Checking {} (Google Finance ticker {})", symbol, ticker);

    let (cmp, valuation) = tokio::join!(quotes.fetch_cmp(&symbol, static_cmp), scraper.scrape(&ticker));

    match &cmp {
        Sourced::Fallback(price) => error!("CMP: live fetch failed, fallback {:?}", price),
        other => info!("CMP: {:?}", other.value()),
    }
    let valuation = valuation.into_value();
    info!("P/E ratio: {}", valuation.pe_ratio);
    info!("EPS: {}", valuation.latest_earnings);

    Ok(())
}
