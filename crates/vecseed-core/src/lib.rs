//! Configuration and shared primitives for the vecseed ingestion pipeline.

pub mod config;
pub mod secret;

pub use config::{Config, ConfigError};
pub use secret::Secret;
