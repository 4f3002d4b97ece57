use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use solar_estimate::config::AppConfig;
use solar_estimate::routes;
use solar_estimate::services::cache::{spawn_sweeper, TtlCache};
use solar_estimate::services::estimate::EstimateService;
use solar_estimate::services::production::PvWattsClient;
use solar_estimate::services::rates::{EiaClient, RateLookup, RateResolver};

#[tokio::main]
async fn main() {
    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env();
    info!("Using PORT: {}", config.port);
    info!("Cost assumptions: {:?}", config.assumptions);

    // Rate cache shared by every request, swept in the background
    let cache = Arc::new(TtlCache::new());
    let _sweeper = spawn_sweeper(cache.clone(), config.cache_sweep_interval);

    let live: Option<Arc<dyn RateLookup>> = match &config.eia_api_key {
        Some(key) => Some(Arc::new(EiaClient::new(config.eia_base_url.clone(), key.clone())) as Arc<dyn RateLookup>),
        None => {
            info!("EIA_API_KEY not set, live rate lookup disabled");
            None
        }
    };
    let rates = Arc::new(RateResolver::new(cache, live, config.retry));
    let production = Arc::new(PvWattsClient::new(
        config.pvwatts_base_url.clone(),
        config.nrel_api_key.clone(),
        config.retry,
    ));
    let service = Arc::new(EstimateService::new(production, rates, config.assumptions.clone()));

    // Bind to 0.0.0.0 for container hosts
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes::routes(service).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
}
