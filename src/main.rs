use dotenv::dotenv;
use log::{error, info};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use portfolio_dashboard::config::AppConfig;
use portfolio_dashboard::middleware::rate_limit::RateLimiter;
use portfolio_dashboard::routes;
use portfolio_dashboard::services::cache::build_cache;
use portfolio_dashboard::services::holdings::HoldingSource;
use portfolio_dashboard::services::portfolio::PortfolioService;
use portfolio_dashboard::services::quotes::{QuoteFetcher, YahooQuoteProvider};
use portfolio_dashboard::services::valuation::{GoogleFinancePages, ValuationScraper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    // A panicking request task is logged and dropped; the server keeps running.
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Uncaught panic: {}", panic_info);
    }));

    let config = AppConfig::from_env()?;

    let http = Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()?;
    let cache = build_cache(&config).await;

    let quotes = QuoteFetcher::new(
        Arc::new(YahooQuoteProvider::new(http.clone())),
        cache.clone(),
        config.cache_ttl,
    )
    .only_when_market_open(config.quotes_only_when_market_open);
    let valuations = ValuationScraper::new(
        Arc::new(GoogleFinancePages::new(http)),
        cache,
        config.cache_ttl,
    );
    let service = Arc::new(PortfolioService::new(
        HoldingSource::File(config.portfolio_file.clone()),
        quotes,
        valuations,
    ));
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_max, config.rate_limit_window));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    let api = routes::routes(service, limiter).with(cors);
    info!("Routes configured successfully with CORS.");

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Server running on http://localhost:{}", config.port);
    warp::serve(api).run(addr).await;

    Ok(())
}
