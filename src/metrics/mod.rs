//! Telemetry forwarded to InfluxDB
//!
//! Every metered request produces one `webapp` point and every user mutation
//! one `user_operations` point. Points are written one at a time; a failed
//! write is logged and dropped so the metrics backend can never take the
//! HTTP surface down with it.

pub mod influx;
pub mod line_protocol;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Measurement names
pub mod names {
    pub const WEBAPP: &str = "webapp";
    pub const USER_OPERATIONS: &str = "user_operations";
}

/// Tag keys
pub mod labels {
    pub const METHOD: &str = "method";
    pub const PATH: &str = "path";
    pub const OPERATION: &str = "operation";
}

/// Field keys
pub mod fields {
    pub const COUNT: &str = "count";
    pub const DURATION: &str = "duration";
}

/// Values of the `operation` tag
pub mod operations {
    pub const INSERT: &str = "insert";
    pub const DELETE: &str = "delete";
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Invalid InfluxDB address: {0}")]
    InvalidAddress(String),

    #[error("Point for measurement {0} has no fields")]
    EmptyFields(String),

    #[error("Field {0} is not a finite number")]
    NonFiniteField(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("InfluxDB responded with {status}: {body}")]
    Server { status: u16, body: String },
}

/// Value of a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// One measurement sample: tags and fields stamped with its capture time
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Start a point for `measurement` stamped with the current time
    pub fn new(measurement: &str) -> Self {
        Self {
            measurement: measurement.to_string(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    #[cfg(test)]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Destination for metric points
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn write(&self, point: Point) -> Result<(), MetricsError>;
}

/// Request-facing recorder shared through the application state
#[derive(Clone)]
pub struct Metrics {
    sink: Arc<dyn MetricsSink>,
}

impl Metrics {
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self { sink }
    }

    /// Write a point, logging instead of failing when the sink rejects it
    pub async fn write(&self, point: Point) {
        let measurement = point.measurement.clone();
        if let Err(e) = self.sink.write(point).await {
            tracing::warn!("Failed to write {} point to metrics sink: {}", measurement, e);
        }
    }

    /// Record one served HTTP request
    pub async fn record_http_request(&self, method: &str, path: &str, duration_secs: f64) {
        let point = Point::new(names::WEBAPP)
            .tag(labels::METHOD, method)
            .tag(labels::PATH, path)
            .field(fields::COUNT, 1i64)
            .field(fields::DURATION, duration_secs);

        self.write(point).await;
    }

    /// Record a bulk user mutation
    pub async fn record_user_operation(&self, operation: &str, count: u64) {
        let point = Point::new(names::USER_OPERATIONS)
            .tag(labels::OPERATION, operation)
            .field(fields::COUNT, count);

        self.write(point).await;
    }
}
