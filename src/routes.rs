// src/routes.rs
use log::info;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::{health::health_check, portfolio::get_portfolio};
use crate::middleware::rate_limit::{rate_limit, RateLimited, RateLimiter};
use crate::services::portfolio::PortfolioService;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code: StatusCode;
    let message: &str;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found";
    } else if err.find::<RateLimited>().is_some() {
        code = StatusCode::TOO_MANY_REQUESTS;
        message = "Too many requests, please try again later.";
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = &api_error.message;
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed";
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error";
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    service: Arc<PortfolioService>,
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let service_filter = warp::any().map(move || service.clone());

    let portfolio_route = warp::path!("api" / "portfolio")
        .and(warp::get())
        .and(service_filter)
        .and_then(get_portfolio);

    let health_route = warp::path!("health")
        .and(warp::get())
        .and_then(health_check);

    info!("All routes configured successfully.");

    rate_limit(limiter)
        .and(portfolio_route.or(health_route))
        .recover(handle_rejection)
}
