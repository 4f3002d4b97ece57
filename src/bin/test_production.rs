// src/bin/test_production.rs
use log::info;

use solar_estimate::config::AppConfig;
use solar_estimate::models::EstimateRequest;
use solar_estimate::services::estimate::production_request_for;
use solar_estimate::services::production::{ProductionSource, PvWattsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = AppConfig::from_env();

    let mut args = std::env::args().skip(1);
    let latitude: f64 = args.next().as_deref().unwrap_or("33.4484").parse()?;
    let longitude: f64 = args.next().as_deref().unwrap_or("-112.0740").parse()?;

    let request = EstimateRequest {
        latitude,
        longitude,
        ..EstimateRequest::default()
    };
    info!("Testing PVWatts production fetch for ({}, {})...", latitude, longitude);

    let client = PvWattsClient::new(config.pvwatts_base_url.clone(), config.nrel_api_key.clone(), config.retry);
    let profile = client.fetch_production(&production_request_for(&request)).await?;

    println!("System:        {} kW, tilt {}, azimuth {}, losses {}%",
        profile.system_capacity_kw, profile.tilt_deg, profile.azimuth_deg, profile.losses_pct);
    println!("Annual:        {:.0} kWh", profile.annual_kwh);
    println!("Monthly:       {:?}", profile.monthly_kwh.iter().map(|m| m.round()).collect::<Vec<_>>());
    println!("Solar resource {:.2} kWh/m2/day", profile.solar_resource_kwh_m2_day);
    Ok(())
}
