use async_trait::async_trait;
use portfolio_dashboard::middleware::rate_limit::RateLimiter;
use portfolio_dashboard::models::Holding;
use portfolio_dashboard::routes::routes;
use portfolio_dashboard::services::cache::{Cache, MemoryCache};
use portfolio_dashboard::services::holdings::HoldingSource;
use portfolio_dashboard::services::portfolio::PortfolioService;
use portfolio_dashboard::services::quotes::{QuoteFetcher, QuoteProvider};
use portfolio_dashboard::services::valuation::{QuotePageSource, ValuationScraper};
use portfolio_dashboard::BoxError;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const INFY_PAGE: &str = r#"<html><body>
    <div><div><span>P/E ratio</span></div><div>27.31</div></div>
    <table><tr><td>Earnings per share</td><td>63.39</td></tr></table>
</body></html>"#;

struct FakeYahoo;

#[async_trait]
impl QuoteProvider for FakeYahoo {
    async fn latest_price(&self, symbol: &str) -> Result<f64, BoxError> {
        match symbol {
            "INFY.NS" => Ok(1500.0),
            _ => Err(format!("HTTP 404 for {}", symbol).into()),
        }
    }
}

struct FakeGoogle;

#[async_trait]
impl QuotePageSource for FakeGoogle {
    async fn fetch_page(&self, ticker: &str) -> Result<String, BoxError> {
        match ticker {
            "INFY:NSE" => Ok(INFY_PAGE.to_string()),
            _ => Err(format!("timed out fetching {}", ticker).into()),
        }
    }
}

fn holding(symbol: &str, exchange: &str, sector: &str, quantity: f64, investment: f64) -> Holding {
    serde_json::from_value(serde_json::json!({
        "particulars": exchange,
        "yahooSymbol": symbol,
        "exchange": exchange,
        "sector": sector,
        "quantity": quantity,
        "investment": investment,
        "staticCMP": 250.0
    }))
    .unwrap()
}

fn service_with(source: HoldingSource, cache: Arc<dyn Cache>) -> Arc<PortfolioService> {
    let ttl = Duration::from_secs(60);
    Arc::new(PortfolioService::new(
        source,
        QuoteFetcher::new(Arc::new(FakeYahoo), cache.clone(), ttl),
        ValuationScraper::new(Arc::new(FakeGoogle), cache, ttl),
    ))
}

fn fixed(holdings: Vec<Holding>) -> HoldingSource {
    HoldingSource::Fixed(Arc::new(holdings))
}

fn client() -> SocketAddr {
    "203.0.113.7:40000".parse().unwrap()
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn portfolio_endpoint_enriches_and_groups() {
    let holdings = vec![
        holding("INFY.NS", "INFY", "IT", 10.0, 1000.0),
        holding("TCS.NS", "TCS", "IT", 4.0, 2000.0),
        holding("500400.BO", "500400", "Power", 100.0, 0.0),
    ];
    let api = routes(
        service_with(fixed(holdings), Arc::new(MemoryCache::new())),
        Arc::new(RateLimiter::new(100, Duration::from_secs(900))),
    );

    let res = warp::test::request()
        .method("GET")
        .path("/api/portfolio")
        .remote_addr(client())
        .reply(&api)
        .await;

    assert_eq!(res.status(), 200);
    let body = body_json(res.body());
    let portfolio = body["portfolio"].as_array().unwrap();
    assert_eq!(portfolio.len(), 3);

    let infy = &portfolio[0];
    assert_eq!(infy["symbol"], "INFY");
    assert_eq!(infy["yahooSymbol"], "INFY.NS");
    assert_eq!(infy["cmp"], 1500.0);
    assert_eq!(infy["peRatio"], "27.31");
    assert_eq!(infy["latestEarnings"], "63.39");
    assert_eq!(infy["presentValue"], 15000.0);
    assert_eq!(infy["gainLoss"], 14000.0);
    assert_eq!(infy["gainLossPercentage"], 1400.0);

    let tcs = &portfolio[1];
    assert_eq!(tcs["cmp"], 250.0);
    assert_eq!(tcs["staticCMP"], 250.0);
    assert_eq!(tcs["peRatio"], "Error");
    assert_eq!(tcs["latestEarnings"], "Error");

    let power = &portfolio[2];
    assert_eq!(power["gainLossPercentage"], 0.0);

    assert_eq!(body["sectors"]["IT"]["totalInvestment"], 3000.0);
    assert_eq!(body["sectors"]["IT"]["totalPresentValue"], 16000.0);
    assert_eq!(body["sectors"]["Power"]["totalPresentValue"], 25000.0);
    assert_eq!(body["sectors"]["Power"]["totalRevenueTTM"], 0.0);
}

#[tokio::test]
async fn broken_holding_file_gives_generic_500() {
    let source = HoldingSource::File(PathBuf::from("no/such/portfolio.json"));
    let api = routes(
        service_with(source, Arc::new(MemoryCache::new())),
        Arc::new(RateLimiter::new(100, Duration::from_secs(900))),
    );

    let res = warp::test::request()
        .path("/api/portfolio")
        .remote_addr(client())
        .reply(&api)
        .await;

    assert_eq!(res.status(), 500);
    let body = body_json(res.body());
    assert_eq!(body["error"], "Failed to fetch portfolio data");
    assert!(!body.to_string().contains("no/such"));
}

#[tokio::test]
async fn health_and_unknown_paths() {
    let api = routes(
        service_with(fixed(vec![]), Arc::new(MemoryCache::new())),
        Arc::new(RateLimiter::new(100, Duration::from_secs(900))),
    );

    let res = warp::test::request().path("/health").remote_addr(client()).reply(&api).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res.body()), serde_json::json!({ "status": "OK" }));

    let res = warp::test::request().path("/api/holdings").remote_addr(client()).reply(&api).await;
    assert_eq!(res.status(), 404);
    assert_eq!(body_json(res.body())["error"], "Not Found");
}

#[tokio::test]
async fn requests_over_the_limit_are_rejected() {
    let api = routes(
        service_with(fixed(vec![]), Arc::new(MemoryCache::new())),
        Arc::new(RateLimiter::new(2, Duration::from_secs(900))),
    );

    for _ in 0..2 {
        let res = warp::test::request().path("/health").remote_addr(client()).reply(&api).await;
        assert_eq!(res.status(), 200);
    }

    let res = warp::test::request().path("/health").remote_addr(client()).reply(&api).await;
    assert_eq!(res.status(), 429);
    assert_eq!(
        body_json(res.body())["error"],
        "Too many requests, please try again later."
    );

    let other: SocketAddr = "198.51.100.2:5000".parse().unwrap();
    let res = warp::test::request().path("/health").remote_addr(other).reply(&api).await;
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let cache = Arc::new(MemoryCache::new());
    let api = routes(
        service_with(fixed(vec![holding("INFY.NS", "INFY", "IT", 1.0, 100.0)]), cache.clone()),
        Arc::new(RateLimiter::new(100, Duration::from_secs(900))),
    );

    let res = warp::test::request().path("/api/portfolio").remote_addr(client()).reply(&api).await;
    assert_eq!(res.status(), 200);

    assert_eq!(cache.get("cmp:INFY.NS").await.as_deref(), Some("1500"));
    assert!(cache.get("googleFinance:INFY:NSE").await.is_some());

    // Poison the cached price to prove the second response reads it back
    cache.set("cmp:INFY.NS", "1750.5", Duration::from_secs(60)).await;
    let res = warp::test::request().path("/api/portfolio").remote_addr(client()).reply(&api).await;
    let body = body_json(res.body());
    assert_eq!(body["portfolio"][0]["cmp"], 1750.5);
}
