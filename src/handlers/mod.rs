// src/handlers/mod.rs
pub mod error;
pub mod estimate;
pub mod rates;
