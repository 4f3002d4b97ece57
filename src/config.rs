// src/config.rs
use log::warn;
use std::env;
use std::time::Duration;

use crate::models::CostAssumptions;
use crate::services::production::PVWATTS_URL;
use crate::services::rates::EIA_RETAIL_SALES_URL;
use crate::services::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub nrel_api_key: String,
    pub pvwatts_base_url: String,
    /// `None` disables the live rate tier.
    pub eia_api_key: Option<String>,
    pub eia_base_url: String,
    pub assumptions: CostAssumptions,
    pub retry: RetryPolicy,
    pub cache_sweep_interval: Duration,
}

fn parse_non_negative(key: &str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => {
            warn!("{}={:?} is not a valid non-negative number", key, raw);
            None
        }
    }
}

/// Reads a non-negative number from `lookup`, falling back to `default`.
fn number<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|raw| parse_non_negative(key, &raw))
        .unwrap_or(default)
}

/// Like [`number`], but the variable is a percentage and the result a fraction.
fn percent<F>(lookup: &F, key: &str, default_fraction: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|raw| parse_non_negative(key, &raw))
        .map(|pct| pct / 100.0)
        .unwrap_or(default_fraction)
}

fn text<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CostAssumptions {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = CostAssumptions::default();
        CostAssumptions {
            cost_per_watt: number(lookup, "SOLAR_COST_PER_WATT", d.cost_per_watt),
            degradation_rate: percent(lookup, "SOLAR_DEGRADATION_PCT", d.degradation_rate),
            om_per_kw_year: number(lookup, "SOLAR_OM_PER_KW_YEAR", d.om_per_kw_year),
            itc_rate: percent(lookup, "SOLAR_ITC_PCT", d.itc_rate),
            rate_escalation: percent(lookup, "RATE_ESCALATION_PCT", d.rate_escalation),
            discount_rate: percent(lookup, "DISCOUNT_RATE_PCT", d.discount_rate),
            co2_lbs_per_kwh: number(lookup, "CO2_LBS_PER_KWH", d.co2_lbs_per_kwh),
            rebate_usd: number(lookup, "SOLAR_REBATE_USD", d.rebate_usd),
        }
    }
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match text(&lookup, "PORT") {
            None => {
                warn!("$PORT not set, defaulting to 3030");
                3030
            }
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("PORT={:?} is not a port number, defaulting to 3030", raw);
                3030
            }),
        };

        let retry_default = RetryPolicy::default();
        let max_attempts = number(&lookup, "RETRY_MAX_ATTEMPTS", f64::from(retry_default.max_attempts));
        let base_delay_ms = number(
            &lookup,
            "RETRY_BASE_DELAY_MS",
            retry_default.base_delay.as_millis() as f64,
        );
        let sweep_secs = number(&lookup, "CACHE_SWEEP_SECS", 300.0).max(1.0);

        AppConfig {
            port,
            nrel_api_key: text(&lookup, "NREL_API_KEY").unwrap_or_else(|| {
                warn!("NREL_API_KEY not set, using DEMO_KEY");
                "DEMO_KEY".to_string()
            }),
            pvwatts_base_url: text(&lookup, "PVWATTS_BASE_URL").unwrap_or_else(|| PVWATTS_URL.to_string()),
            eia_api_key: text(&lookup, "EIA_API_KEY"),
            eia_base_url: text(&lookup, "EIA_BASE_URL")
                .unwrap_or_else(|| EIA_RETAIL_SALES_URL.to_string()),
            assumptions: CostAssumptions::from_lookup(&lookup),
            retry: RetryPolicy {
                max_attempts: (max_attempts as u32).max(1),
                base_delay: Duration::from_millis(base_delay_ms as u64),
            },
            cache_sweep_interval: Duration::from_secs(sweep_secs as u64),
        }
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }
}
