// src/middleware/rate_limit.rs
use log::{debug, warn};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use warp::reject::Reject;
use warp::{Filter, Rejection};

/// Stale windows are swept once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug)]
pub struct RateLimited;

impl Reject for RateLimited {}

#[derive(Debug)]
struct ClientWindow {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, ClientWindow>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        RateLimiter {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Counts a request from `ip`; false once the client is over its allowance.
    pub async fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        if clients.len() > SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
            debug!("Rate limiter swept stale windows, {} clients left", clients.len());
        }

        let entry = clients.entry(ip).or_insert(ClientWindow { started: now, count: 0 });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max_requests
    }
}

pub fn rate_limit(limiter: Arc<RateLimiter>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::addr::remote()
        .and_then(move |addr: Option<SocketAddr>| {
            let limiter = limiter.clone();
            async move {
                let ip = addr
                    .map(|a| a.ip())
                    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                if limiter.check(ip).await {
                    Ok(())
                } else {
                    warn!("Rate limit exceeded for {}", ip);
                    Err(warp::reject::custom(RateLimited))
                }
            }
        })
        .untuple_one()
}
