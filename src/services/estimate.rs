// src/services/estimate.rs
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CostAssumptions, Estimate, EstimateRequest, ProductionProfile, RateResult, SystemSpecs,
};
use crate::services::production::{ProductionDataError, ProductionRequest, ProductionSource};
use crate::services::projection::{project_financials, FinancialProjection};
use crate::services::rates::RateResolver;

pub const DEFAULT_SYSTEM_KW: f64 = 7.5;
pub const DEFAULT_TILT_DEG: f64 = 20.0;
pub const DEFAULT_AZIMUTH_DEG: f64 = 180.0;
pub const DEFAULT_LOSSES_PCT: f64 = 14.0;

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Production(#[from] ProductionDataError),
}

fn in_range(value: Option<f64>, min: f64, max: f64, default: f64) -> f64 {
    value
        .filter(|v| v.is_finite() && *v >= min && *v <= max)
        .unwrap_or(default)
}

/// Geometry to model, with defaults filled in. The request itself is left untouched.
pub fn production_request_for(request: &EstimateRequest) -> ProductionRequest {
    ProductionRequest {
        latitude: request.latitude,
        longitude: request.longitude,
        system_capacity_kw: request
            .system_size_kw
            .filter(|kw| kw.is_finite() && *kw > 0.0)
            .unwrap_or(DEFAULT_SYSTEM_KW),
        tilt_deg: in_range(request.tilt_deg, 0.0, 90.0, DEFAULT_TILT_DEG),
        azimuth_deg: in_range(request.azimuth_deg, 0.0, 360.0, DEFAULT_AZIMUTH_DEG),
        losses_pct: in_range(request.losses_pct, 0.0, 99.0, DEFAULT_LOSSES_PCT),
        module_type: request.module_type,
        array_type: request.array_type,
        dc_ac_ratio: None,
        inverter_efficiency_pct: None,
    }
}

/// Composes the production source, rate resolver and projection into estimates.
pub struct EstimateService {
    production: Arc<dyn ProductionSource>,
    rates: Arc<RateResolver>,
    assumptions: CostAssumptions,
}

impl EstimateService {
    pub fn new(
        production: Arc<dyn ProductionSource>,
        rates: Arc<RateResolver>,
        assumptions: CostAssumptions,
    ) -> Self {
        EstimateService {
            production,
            rates,
            assumptions,
        }
    }

    pub fn assumptions(&self) -> &CostAssumptions {
        &self.assumptions
    }

    pub async fn fetch_production(
        &self,
        request: &EstimateRequest,
    ) -> Result<ProductionProfile, ProductionDataError> {
        self.production
            .fetch_production(&production_request_for(request))
            .await
    }

    pub async fn resolve_rate(&self, state: Option<&str>) -> RateResult {
        self.rates.resolve(state).await
    }

    pub async fn compute_estimate(&self, request: &EstimateRequest) -> Result<Estimate, EstimateError> {
        info!("Computing estimate for '{}'", request.address);

        let (production, rate) = tokio::join!(
            self.fetch_production(request),
            self.resolve_rate(request.state.as_deref()),
        );
        let profile = production.map_err(|e| {
            error!("No estimate for '{}': {}", request.address, e);
            e
        })?;

        let projection = project_financials(request, &profile, &rate, &self.assumptions);
        let estimate = self.assemble(request, &profile, rate, projection);
        info!(
            "Estimate {}: {} kW, payback year {}, rate {} ({})",
            estimate.id,
            estimate.system.size_kw,
            estimate.payback_year,
            estimate.rate_usd_per_kwh,
            estimate.rate_source
        );
        Ok(estimate)
    }

    fn assemble(
        &self,
        request: &EstimateRequest,
        profile: &ProductionProfile,
        rate: RateResult,
        projection: FinancialProjection,
    ) -> Estimate {
        Estimate {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            address: request.address.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            system: SystemSpecs {
                size_kw: projection.system_size_kw,
                tilt_deg: profile.tilt_deg,
                azimuth_deg: profile.azimuth_deg,
                losses_pct: profile.losses_pct,
                shading_pct: projection.shading_pct,
            },
            annual_production_kwh: projection.annual_production_kwh,
            monthly_production_kwh: projection.monthly_production_kwh,
            solar_resource_kwh_m2_day: profile.solar_resource_kwh_m2_day,
            gross_cost_usd: projection.gross_cost_usd,
            net_cost_usd: projection.net_cost_usd,
            year1_savings_usd: projection.year1_savings_usd,
            payback_year: projection.payback_year,
            simple_payback: projection.simple_payback,
            npv_25yr_usd: projection.npv_25yr_usd,
            co2_offset_lbs_per_year: projection.co2_offset_lbs_per_year,
            co2_offset_lbs_25yr: projection.co2_offset_lbs_25yr,
            rate_usd_per_kwh: rate.rate_usd_per_kwh,
            rate_source: rate.source,
            rate_state: rate.state,
            assumptions: self.assumptions.clone(),
            cashflow: projection.cashflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::production::{ArrayType, ModuleType};

    #[test]
    fn defaults_fill_missing_geometry() {
        let request = EstimateRequest {
            latitude: 40.0,
            longitude: -105.0,
            ..EstimateRequest::default()
        };
        let p = production_request_for(&request);
        assert_eq!(p.system_capacity_kw, DEFAULT_SYSTEM_KW);
        assert_eq!(p.tilt_deg, DEFAULT_TILT_DEG);
        assert_eq!(p.azimuth_deg, DEFAULT_AZIMUTH_DEG);
        assert_eq!(p.losses_pct, DEFAULT_LOSSES_PCT);
        assert!(p.module_type.is_none());
        assert!(p.array_type.is_none());
        assert!(request.system_size_kw.is_none());
    }

    #[test]
    fn equipment_choices_pass_through() {
        let request: EstimateRequest = serde_json::from_value(serde_json::json!({
            "latitude": 40.0,
            "longitude": -105.0,
            "module_type": "premium",
            "array_type": "fixed_roof_mount"
        }))
        .unwrap();
        let p = production_request_for(&request);
        assert_eq!(p.module_type, Some(ModuleType::Premium));
        assert_eq!(p.array_type, Some(ArrayType::FixedRoofMount));
    }

    #[test]
    fn out_of_range_geometry_falls_back() {
        let request = EstimateRequest {
            system_size_kw: Some(f64::NAN),
            tilt_deg: Some(120.0),
            azimuth_deg: Some(90.0),
            losses_pct: Some(-3.0),
            ..EstimateRequest::default()
        };
        let p = production_request_for(&request);
        assert_eq!(p.system_capacity_kw, DEFAULT_SYSTEM_KW);
        assert_eq!(p.tilt_deg, DEFAULT_TILT_DEG);
        assert_eq!(p.azimuth_deg, 90.0);
        assert_eq!(p.losses_pct, DEFAULT_LOSSES_PCT);
    }
}
