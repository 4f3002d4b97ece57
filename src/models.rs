// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::calculations::CO2_LBS_PER_KWH;
use crate::services::production::{ArrayType, ModuleType};

/// Length of the financial projection, in years.
pub const PROJECTION_YEARS: u32 = 25;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub system_size_kw: Option<f64>,
    #[serde(default)]
    pub tilt_deg: Option<f64>,
    #[serde(default)]
    pub azimuth_deg: Option<f64>,
    #[serde(default)]
    pub losses_pct: Option<f64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    /// Share of production lost to shading, 0-100.
    #[serde(default)]
    pub shading_pct: Option<f64>,
    #[serde(default)]
    pub module_type: Option<ModuleType>,
    #[serde(default)]
    pub array_type: Option<ArrayType>,
}

/// Modeled output of an array for one year, as reported by the production service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionProfile {
    pub system_capacity_kw: f64,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub losses_pct: f64,
    pub annual_kwh: f64,
    pub monthly_kwh: Vec<f64>,
    /// Daily average over the year, kWh/m2/day.
    pub solar_resource_kwh_m2_day: f64,
}

/// Which tier of the rate chain produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateSource {
    LiveApi,
    StateFallback,
    GenericDefault,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSource::LiveApi => "live-api",
            RateSource::StateFallback => "state-fallback",
            RateSource::GenericDefault => "generic-default",
        }
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateResult {
    pub rate_usd_per_kwh: f64,
    pub source: RateSource,
    pub state: Option<String>,
}

/// Cost and economic inputs, read once from configuration per process.
///
/// Rates and percentages are stored as fractions (0.30 for a 30% credit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAssumptions {
    pub cost_per_watt: f64,
    pub degradation_rate: f64,
    pub om_per_kw_year: f64,
    pub itc_rate: f64,
    pub rate_escalation: f64,
    pub discount_rate: f64,
    pub co2_lbs_per_kwh: f64,
    pub rebate_usd: f64,
}

impl Default for CostAssumptions {
    fn default() -> Self {
        CostAssumptions {
            cost_per_watt: 3.00,
            degradation_rate: 0.005,
            om_per_kw_year: 22.0,
            itc_rate: 0.30,
            rate_escalation: 0.025,
            discount_rate: 0.05,
            co2_lbs_per_kwh: CO2_LBS_PER_KWH,
            rebate_usd: 0.0,
        }
    }
}

/// One year of the projection. Money and energy are rounded to whole units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowYear {
    pub year: u32,
    pub production_kwh: f64,
    pub savings_usd: f64,
    pub cumulative_savings_usd: f64,
    pub net_cashflow_usd: f64,
}

/// Simple payback: either a finite number of years or explicitly unbounded
/// when there is no cost to recover or no savings to recover it with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "years", rename_all = "snake_case")]
pub enum Payback {
    Years(f64),
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSpecs {
    pub size_kw: f64,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub losses_pct: f64,
    pub shading_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub system: SystemSpecs,
    pub annual_production_kwh: f64,
    pub monthly_production_kwh: Vec<f64>,
    pub solar_resource_kwh_m2_day: f64,
    pub gross_cost_usd: f64,
    pub net_cost_usd: f64,
    pub year1_savings_usd: f64,
    pub payback_year: u32,
    pub simple_payback: Payback,
    pub npv_25yr_usd: f64,
    pub co2_offset_lbs_per_year: f64,
    pub co2_offset_lbs_25yr: f64,
    pub rate_usd_per_kwh: f64,
    pub rate_source: RateSource,
    pub rate_state: Option<String>,
    pub assumptions: CostAssumptions,
    pub cashflow: Vec<CashflowYear>,
}
