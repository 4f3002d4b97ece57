// src/handlers/estimate.rs
use log::{error, info};
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::EstimateRequest;
use crate::services::estimate::EstimateService;

pub async fn post_estimate(
    request: EstimateRequest,
    service: Arc<EstimateService>,
) -> Result<Json, Rejection> {
    info!(
        "Handling estimate request for '{}' ({}, {})",
        request.address, request.latitude, request.longitude
    );

    if !(request.latitude.is_finite() && (-90.0..=90.0).contains(&request.latitude))
        || !(request.longitude.is_finite() && (-180.0..=180.0).contains(&request.longitude))
    {
        return Err(warp::reject::custom(ApiError::bad_request(
            "latitude/longitude out of range",
        )));
    }

    match service.compute_estimate(&request).await {
        Ok(estimate) => Ok(warp::reply::json(&estimate)),
        Err(e) => {
            error!("Estimate failed: {}", e);
            Err(warp::reject::custom(ApiError::upstream_error(e.to_string())))
        }
    }
}
