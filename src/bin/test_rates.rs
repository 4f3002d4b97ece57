// src/bin/test_rates.rs
use log::{error, info};
use std::sync::Arc;

use solar_estimate::config::AppConfig;
use solar_estimate::services::cache::TtlCache;
use solar_estimate::services::rates::{EiaClient, RateLookup, RateResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = AppConfig::from_env();

    let states: Vec<String> = std::env::args().skip(1).collect();
    let states = if states.is_empty() {
        vec!["CA".to_string(), "TX".to_string(), "ZZ".to_string()]
    } else {
        states
    };

    let live: Option<Arc<dyn RateLookup>> = config
        .eia_api_key
        .as_ref()
        .map(|key| Arc::new(EiaClient::new(config.eia_base_url.clone(), key.clone())) as Arc<dyn RateLookup>);

    if let Some(client) = &live {
        info!("Testing EIA residential rate lookup...");
        for state in &states {
            match client.residential_rate(state).await {
                Ok(rate) => info!("SUCCESS: EIA rate for {}: {:.4} USD/kWh", state, rate),
                Err(e) => error!("ERROR: EIA lookup for {} failed: {}", state, e),
            }
        }
    }

    let resolver = RateResolver::new(Arc::new(TtlCache::new()), live, config.retry);
    for state in &states {
        let rate = resolver.resolve(Some(state)).await;
        println!("{:>3}: {:.4} USD/kWh ({})", state, rate.rate_usd_per_kwh, rate.source);
    }
    println!("---: {:?}", resolver.resolve(None).await);

    Ok(())
}
