// src/handlers/portfolio.rs
use log::{error, info};
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::portfolio::PortfolioService;

pub async fn get_portfolio(service: Arc<PortfolioService>) -> Result<Json, Rejection> {
    info!("Handling request to get portfolio data");

    match service.get_portfolio().await {
        Ok(data) => {
            info!(
                "Returning {} holdings across {} sectors",
                data.portfolio.len(),
                data.sectors.len()
            );
            Ok(warp::reply::json(&data))
        }
        Err(e) => {
            // Full chain stays in the server log
            error!("Error fetching portfolio data: {:#}", e);
            Err(warp::reject::custom(ApiError::new("Failed to fetch portfolio data")))
        }
    }
}
