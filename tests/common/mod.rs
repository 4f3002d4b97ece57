#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use solar_estimate::models::{CostAssumptions, ProductionProfile, RateResult};
use solar_estimate::services::cache::TtlCache;
use solar_estimate::services::estimate::EstimateService;
use solar_estimate::services::production::{ProductionDataError, ProductionRequest, ProductionSource};
use solar_estimate::services::rates::{RateLookup, RateResolver};
use solar_estimate::services::retry::RetryPolicy;
use solar_estimate::BoxError;

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
    }
}

/// Live rate tier that answers with a fixed value or always fails.
pub struct FakeRates {
    pub rate: Option<f64>,
    pub calls: AtomicUsize,
}

impl FakeRates {
    pub fn answering(rate: f64) -> Arc<Self> {
        Arc::new(FakeRates {
            rate: Some(rate),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(FakeRates {
            rate: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLookup for FakeRates {
    async fn residential_rate(&self, _state: &str) -> Result<f64, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rate.ok_or_else(|| "connection refused".into())
    }
}

pub fn sample_profile(request: &ProductionRequest) -> ProductionProfile {
    let monthly = vec![
        650.0, 720.0, 900.0, 980.0, 1060.0, 1080.0, 1050.0, 1010.0, 920.0, 810.0, 680.0, 590.0,
    ];
    ProductionProfile {
        system_capacity_kw: request.system_capacity_kw,
        tilt_deg: request.tilt_deg,
        azimuth_deg: request.azimuth_deg,
        losses_pct: request.losses_pct,
        annual_kwh: monthly.iter().sum(),
        monthly_kwh: monthly,
        solar_resource_kwh_m2_day: 5.42,
    }
}

/// Production source that echoes the request geometry with a fixed yield, or fails.
pub struct FakeProduction {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeProduction {
    pub fn working() -> Arc<Self> {
        Arc::new(FakeProduction {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(FakeProduction {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ProductionSource for FakeProduction {
    async fn fetch_production(
        &self,
        request: &ProductionRequest,
    ) -> Result<ProductionProfile, ProductionDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProductionDataError::MissingField("ac_annual"));
        }
        Ok(sample_profile(request))
    }
}

pub fn resolver(live: Option<Arc<FakeRates>>) -> (Arc<TtlCache<RateResult>>, RateResolver) {
    let cache = Arc::new(TtlCache::new());
    let live = live.map(|l| l as Arc<dyn RateLookup>);
    (cache.clone(), RateResolver::new(cache, live, fast_retry(2)))
}

pub fn service(production: Arc<FakeProduction>, live: Option<Arc<FakeRates>>) -> Arc<EstimateService> {
    let (_, rates) = resolver(live);
    Arc::new(EstimateService::new(
        production,
        Arc::new(rates),
        CostAssumptions::default(),
    ))
}
