// src/lib.rs

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

// Boxed error used by the upstream HTTP plumbing
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
