// src/services/mod.rs
pub mod cache;
pub mod calculations;
pub mod estimate;
pub mod production;
pub mod projection;
pub mod rates;
pub mod retry;
pub mod state_rates;
