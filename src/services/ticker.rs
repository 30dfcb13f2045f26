// src/services/ticker.rs

/// Converts a Yahoo symbol (`RELIANCE.NS`, `TATASTEEL.BO`) into the
/// Google Finance form (`RELIANCE:NSE`, `TATASTEEL:BSE`).
/// Symbols without a known suffix are assumed to trade on NSE.
pub fn to_google_finance_ticker(yahoo_symbol: &str) -> String {
    if let Some(ticker) = yahoo_symbol.strip_suffix(".NS") {
        format!("{}:NSE", ticker)
    } else if let Some(ticker) = yahoo_symbol.strip_suffix(".BO") {
        format!("{}:BSE", ticker)
    } else {
        format!("{}:NSE", yahoo_symbol)
    }
}
