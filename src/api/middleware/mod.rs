//! API Middleware
//!
//! Contains middleware for:
//! - Per-request telemetry to InfluxDB

pub mod metrics;

pub use metrics::metrics_middleware;
