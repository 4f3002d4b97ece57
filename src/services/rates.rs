// src/services/rates.rs
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{RateResult, RateSource};
use crate::services::cache::TtlCache;
use crate::services::retry::{retry_with_backoff, RetryPolicy};
use crate::services::state_rates::{state_rate, GENERIC_DEFAULT_RATE};
use crate::BoxError;

pub const EIA_RETAIL_SALES_URL: &str = "https://api.eia.gov/v2/electricity/retail-sales/data/";

pub const RATE_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// Residential $/kWh outside this band is treated as bad data.
const MIN_VALID_RATE: f64 = 0.01;
const MAX_VALID_RATE: f64 = 1.0;

pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > MIN_VALID_RATE && rate < MAX_VALID_RATE
}

/// The live tier of the rate chain.
#[async_trait]
pub trait RateLookup: Send + Sync {
    /// Most recent residential retail price for `state` in USD/kWh. Not range-checked.
    async fn residential_rate(&self, state: &str) -> Result<f64, BoxError>;
}

/// Client for the EIA v2 retail-sales dataset.
pub struct EiaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EiaClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        EiaClient {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

/// Pulls the newest price out of a retail-sales body. EIA reports cents/kWh,
/// sometimes as a string.
pub fn parse_eia_price(body: &Value) -> Result<f64, BoxError> {
    let row = body
        .pointer("/response/data/0")
        .ok_or("EIA response has no data rows")?;
    let cents = match row.get("price") {
        Some(Value::Number(n)) => n.as_f64().ok_or("EIA price is not a float")?,
        Some(Value::String(s)) => s.trim().parse::<f64>()?,
        _ => return Err("EIA row has no price".into()),
    };
    Ok(cents / 100.0)
}

#[async_trait]
impl RateLookup for EiaClient {
    async fn residential_rate(&self, state: &str) -> Result<f64, BoxError> {
        info!("Fetching residential rate for {} from EIA", state);
        let query = [
            ("api_key", self.api_key.as_str()),
            ("frequency", "monthly"),
            ("data[0]", "price"),
            ("facets[stateid][]", state),
            ("facets[sectorid][]", "RES"),
            ("sort[0][column]", "period"),
            ("sort[0][direction]", "desc"),
            ("offset", "0"),
            ("length", "1"),
        ];
        let body = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        parse_eia_price(&body)
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

pub fn rate_cache_key(state: &str) -> String {
    format!("rate:{:016x}", fnv1a64(state.as_bytes()))
}

fn normalize_state(state: Option<&str>) -> Option<String> {
    state
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
}

fn generic_default(state: Option<String>) -> RateResult {
    RateResult {
        rate_usd_per_kwh: GENERIC_DEFAULT_RATE,
        source: RateSource::GenericDefault,
        state,
    }
}

/// Resolves a residential rate through live lookup, the state table, then the
/// generic default. Never fails.
pub struct RateResolver {
    cache: Arc<TtlCache<RateResult>>,
    live: Option<Arc<dyn RateLookup>>,
    retry: RetryPolicy,
    ttl: Duration,
}

impl RateResolver {
    pub fn new(
        cache: Arc<TtlCache<RateResult>>,
        live: Option<Arc<dyn RateLookup>>,
        retry: RetryPolicy,
    ) -> Self {
        RateResolver {
            cache,
            live,
            retry,
            ttl: RATE_CACHE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn resolve(&self, state: Option<&str>) -> RateResult {
        let Some(state) = normalize_state(state) else {
            debug!("No state given, using generic default rate");
            return generic_default(None);
        };

        let key = rate_cache_key(&state);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Rate cache hit for {} ({})", state, cached.source);
            return cached;
        }
        debug!("Rate cache miss for {}", state);

        let result = match self.live_rate(&state).await {
            Some(rate) => RateResult {
                rate_usd_per_kwh: rate,
                source: RateSource::LiveApi,
                state: Some(state.clone()),
            },
            None => self.fallback(&state),
        };
        info!(
            "Resolved rate for {}: {:.4} USD/kWh ({})",
            state, result.rate_usd_per_kwh, result.source
        );

        self.cache.set(key, result.clone(), self.ttl);
        result
    }

    async fn live_rate(&self, state: &str) -> Option<f64> {
        let live = self.live.as_ref()?;
        match retry_with_backoff("EIA rate lookup", self.retry, || live.residential_rate(state)).await {
            Ok(rate) if is_valid_rate(rate) => Some(rate),
            Ok(rate) => {
                warn!("Discarding out-of-range live rate {} for {}", rate, state);
                None
            }
            Err(e) => {
                warn!("Live rate lookup for {} failed: {}", state, e);
                None
            }
        }
    }

    fn fallback(&self, state: &str) -> RateResult {
        match state_rate(state) {
            Some(rate) => RateResult {
                rate_usd_per_kwh: rate,
                source: RateSource::StateFallback,
                state: Some(state.to_string()),
            },
            None => {
                warn!("No table rate for state {}, using generic default", state);
                generic_default(Some(state.to_string()))
            }
        }
    }
}
