// src/services/mod.rs
pub mod cache;
pub mod holdings;
pub mod market_hours;
pub mod portfolio;
pub mod quotes;
pub mod sectors;
pub mod ticker;
pub mod valuation;
