// src/handlers/rates.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::estimate::EstimateService;

pub async fn get_rate(state: String, service: Arc<EstimateService>) -> Result<Json, Rejection> {
    info!("Handling request to resolve rate for {}", state);
    let rate = service.resolve_rate(Some(&state)).await;
    Ok(warp::reply::json(&rate))
}
