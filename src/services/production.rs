// src/services/production.rs
use async_trait::async_trait;
use log::{error, info};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::ProductionProfile;
use crate::services::retry::{retry_with_backoff, RetryPolicy};
use crate::BoxError;

pub const PVWATTS_URL: &str = "https://developer.nrel.gov/api/pvwatts/v8.json";

pub const DEFAULT_DC_AC_RATIO: f64 = 1.2;
pub const DEFAULT_INVERTER_EFFICIENCY_PCT: f64 = 96.0;

#[derive(Debug, Error)]
pub enum ProductionDataError {
    #[error("production service unavailable: {0}")]
    Upstream(String),
    #[error("production service reported errors: {}", .0.join("; "))]
    UpstreamReported(Vec<String>),
    #[error("production response is missing {0}")]
    MissingField(&'static str),
    #[error("production response has invalid {field}: {detail}")]
    InvalidField { field: &'static str, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    #[default]
    Standard,
    Premium,
    ThinFilm,
}

impl ModuleType {
    pub fn code(&self) -> u8 {
        match self {
            ModuleType::Standard => 0,
            ModuleType::Premium => 1,
            ModuleType::ThinFilm => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayType {
    #[default]
    FixedOpenRack,
    FixedRoofMount,
    OneAxis,
    OneAxisBacktracking,
    TwoAxis,
}

impl ArrayType {
    pub fn code(&self) -> u8 {
        match self {
            ArrayType::FixedOpenRack => 0,
            ArrayType::FixedRoofMount => 1,
            ArrayType::OneAxis => 2,
            ArrayType::OneAxisBacktracking => 3,
            ArrayType::TwoAxis => 4,
        }
    }
}

/// Geometry and equipment sent to the production-modeling service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub system_capacity_kw: f64,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub losses_pct: f64,
    pub module_type: Option<ModuleType>,
    pub array_type: Option<ArrayType>,
    pub dc_ac_ratio: Option<f64>,
    pub inverter_efficiency_pct: Option<f64>,
}

impl ProductionRequest {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("system_capacity", self.system_capacity_kw.to_string()),
            ("tilt", self.tilt_deg.to_string()),
            ("azimuth", self.azimuth_deg.to_string()),
            ("losses", self.losses_pct.to_string()),
            ("module_type", self.module_type.unwrap_or_default().code().to_string()),
            ("array_type", self.array_type.unwrap_or_default().code().to_string()),
            ("dc_ac_ratio", self.dc_ac_ratio.unwrap_or(DEFAULT_DC_AC_RATIO).to_string()),
            (
                "inv_eff",
                self.inverter_efficiency_pct
                    .unwrap_or(DEFAULT_INVERTER_EFFICIENCY_PCT)
                    .to_string(),
            ),
        ]
    }
}

#[async_trait]
pub trait ProductionSource: Send + Sync {
    async fn fetch_production(
        &self,
        request: &ProductionRequest,
    ) -> Result<ProductionProfile, ProductionDataError>;
}

/// Error envelope the API gateway returns for rate limits and bad keys.
#[derive(Debug, Deserialize)]
pub struct GatewayError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PvWattsResponse {
    #[serde(default)]
    pub error: Option<GatewayError>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    pub outputs: Option<PvWattsOutputs>,
}

#[derive(Debug, Deserialize)]
pub struct PvWattsOutputs {
    pub ac_annual: Option<f64>,
    pub ac_monthly: Option<Vec<f64>>,
    pub solrad_annual: Option<f64>,
}

/// PVWatts echoes inputs as strings or numbers; take its value when it parses.
fn echoed(inputs: &Map<String, Value>, key: &str, sent: f64) -> f64 {
    let parsed = match inputs.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(sent)
}

fn checked(field: &'static str, value: f64) -> Result<f64, ProductionDataError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ProductionDataError::InvalidField {
            field,
            detail: format!("{} is not a non-negative number", value),
        });
    }
    Ok(value)
}

/// Maps a decoded PVWatts body onto a [`ProductionProfile`], renaming fields only.
pub fn normalize_response(
    request: &ProductionRequest,
    body: PvWattsResponse,
) -> Result<ProductionProfile, ProductionDataError> {
    if let Some(gateway) = body.error {
        return Err(ProductionDataError::UpstreamReported(vec![format!(
            "{}: {}",
            gateway.code, gateway.message
        )]));
    }
    if !body.errors.is_empty() {
        return Err(ProductionDataError::UpstreamReported(body.errors));
    }
    let outputs = body.outputs.ok_or(ProductionDataError::MissingField("outputs"))?;

    let annual = outputs
        .ac_annual
        .ok_or(ProductionDataError::MissingField("ac_annual"))?;
    let monthly = outputs
        .ac_monthly
        .ok_or(ProductionDataError::MissingField("ac_monthly"))?;
    let solrad = outputs
        .solrad_annual
        .ok_or(ProductionDataError::MissingField("solrad_annual"))?;

    if monthly.len() != 12 {
        return Err(ProductionDataError::InvalidField {
            field: "ac_monthly",
            detail: format!("expected 12 months, got {}", monthly.len()),
        });
    }
    let monthly = monthly
        .into_iter()
        .map(|kwh| checked("ac_monthly", kwh))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProductionProfile {
        system_capacity_kw: echoed(&body.inputs, "system_capacity", request.system_capacity_kw),
        tilt_deg: echoed(&body.inputs, "tilt", request.tilt_deg),
        azimuth_deg: echoed(&body.inputs, "azimuth", request.azimuth_deg),
        losses_pct: echoed(&body.inputs, "losses", request.losses_pct),
        annual_kwh: checked("ac_annual", annual)?,
        monthly_kwh: monthly,
        solar_resource_kwh_m2_day: checked("solrad_annual", solrad)?,
    })
}

/// Client for the NREL PVWatts v8 API.
pub struct PvWattsClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl PvWattsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, retry: RetryPolicy) -> Self {
        PvWattsClient {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            retry,
        }
    }

    async fn fetch_raw(&self, request: &ProductionRequest) -> Result<PvWattsResponse, BoxError> {
        let mut query = request.query();
        query.push(("api_key", self.api_key.clone()));

        let response = self.client.get(&self.base_url).query(&query).send().await?;
        let status = response.status();
        // Other 4xx bodies still carry the service's error list.
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(format!("PVWatts returned HTTP {}", status).into());
        }
        let body = response.json::<PvWattsResponse>().await?;
        Ok(body)
    }
}

#[async_trait]
impl ProductionSource for PvWattsClient {
    async fn fetch_production(
        &self,
        request: &ProductionRequest,
    ) -> Result<ProductionProfile, ProductionDataError> {
        info!(
            "Fetching production for ({:.4}, {:.4}) at {} kW",
            request.latitude, request.longitude, request.system_capacity_kw
        );
        let body = retry_with_backoff("PVWatts fetch", self.retry, || self.fetch_raw(request))
            .await
            .map_err(|e| ProductionDataError::Upstream(e.to_string()))?;

        normalize_response(request, body).map_err(|e| {
            error!("Rejecting PVWatts response: {}", e);
            e
        })
    }
}
