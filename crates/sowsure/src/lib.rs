pub mod config;
pub mod error;
pub mod integrations;
pub mod telemetry;
pub mod workflows;
