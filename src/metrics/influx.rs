//! InfluxDB 1.x HTTP client
//!
//! Speaks the `/ping` and `/write` endpoints directly. Each point is sent
//! alone, in line protocol, at second precision.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use super::{line_protocol, MetricsError, MetricsSink, Point};
use crate::config::defaults;

/// InfluxDB connection configuration
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Server address (e.g., http://influxdb:8086)
    pub url: String,
    /// Target database for all writes
    pub database: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: defaults::INFLUX_URL.to_string(),
            database: defaults::INFLUX_DATABASE.to_string(),
            username: defaults::INFLUX_USER.to_string(),
            password: defaults::INFLUX_PASSWORD.to_string(),
            timeout_ms: defaults::INFLUX_TIMEOUT_MS,
        }
    }
}

pub struct InfluxClient {
    config: InfluxConfig,
    base_url: Url,
    http: Client,
}

impl InfluxClient {
    /// Build a client without touching the network
    pub fn new(config: InfluxConfig) -> Result<Self, MetricsError> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| MetricsError::InvalidAddress(format!("{}: {}", config.url, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(MetricsError::InvalidAddress(format!(
                "{}: unsupported scheme {}",
                config.url,
                base_url.scheme()
            )));
        }

        // Endpoints are joined relative to the base path
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    /// Build a client and verify the server answers `/ping`
    pub async fn connect(config: InfluxConfig) -> Result<Self, MetricsError> {
        let client = Self::new(config)?;
        tracing::info!("Connecting to InfluxDB at {}", client.config.url);
        client.ping().await?;
        tracing::info!("InfluxDB connection established (database: {})", client.config.database);
        Ok(client)
    }

    pub async fn ping(&self) -> Result<(), MetricsError> {
        let response = self.http.get(self.endpoint("ping")?).send().await?;
        Self::check(response).await
    }

    /// Write a single point to the configured database
    pub async fn write_point(&self, point: &Point) -> Result<(), MetricsError> {
        let body = line_protocol::encode(point)?;

        let mut request = self
            .http
            .post(self.endpoint("write")?)
            .query(&[("db", self.config.database.as_str()), ("precision", "s")])
            .body(body);

        if !self.config.username.is_empty() {
            request = request.basic_auth(&self.config.username, Some(&self.config.password));
        }

        let response = request.send().await?;
        Self::check(response).await
    }

    /// Release the client; pooled connections are dropped with it
    pub fn close(self) {
        tracing::info!("InfluxDB client closed");
    }

    fn endpoint(&self, path: &str) -> Result<Url, MetricsError> {
        self.base_url
            .join(path)
            .map_err(|e| MetricsError::InvalidAddress(format!("{}: {}", self.config.url, e)))
    }

    async fn check(response: reqwest::Response) -> Result<(), MetricsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MetricsError::Server {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl MetricsSink for InfluxClient {
    async fn write(&self, point: Point) -> Result<(), MetricsError> {
        self.write_point(&point).await
    }
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("url", &self.config.url)
            .field("database", &self.config.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::{header, HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Router,
    };
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct CapturedWrite {
        query: HashMap<String, String>,
        authorization: Option<String>,
        body: String,
    }

    #[derive(Clone)]
    struct MockInflux {
        writes: Arc<Mutex<Vec<CapturedWrite>>>,
        write_status: AxumStatus,
    }

    async fn ping() -> AxumStatus {
        AxumStatus::NO_CONTENT
    }

    async fn write(
        State(mock): State<MockInflux>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: String,
    ) -> (AxumStatus, &'static str) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        mock.writes.lock().push(CapturedWrite {
            query,
            authorization,
            body,
        });

        if mock.write_status.is_success() {
            (mock.write_status, "")
        } else {
            (mock.write_status, "{\"error\":\"database not found\"}")
        }
    }

    async fn start_mock_influx(write_status: AxumStatus) -> (SocketAddr, MockInflux) {
        let mock = MockInflux {
            writes: Arc::new(Mutex::new(Vec::new())),
            write_status,
        };
        let app = Router::new()
            .route("/ping", get(ping))
            .route("/write", post(write))
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, mock)
    }

    fn config_for(addr: SocketAddr) -> InfluxConfig {
        InfluxConfig {
            url: format!("http://{}", addr),
            timeout_ms: 2000,
            ..Default::default()
        }
    }

    #[test]
    fn test_influx_config_default() {
        let config = InfluxConfig::default();
        assert_eq!(config.url, "http://influxdb:8086");
        assert_eq!(config.database, "metrics");
        assert_eq!(config.username, "grafana");
    }

    #[test]
    fn test_invalid_address() {
        let result = InfluxClient::new(InfluxConfig {
            url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(MetricsError::InvalidAddress(_))));

        let result = InfluxClient::new(InfluxConfig {
            url: "udp://influxdb:8089".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(MetricsError::InvalidAddress(_))));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = InfluxClient::new(InfluxConfig {
            url: "http://metrics.local:8086/influx".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("write").unwrap().as_str(),
            "http://metrics.local:8086/influx/write"
        );

        let client = InfluxClient::new(InfluxConfig {
            url: "http://metrics.local:8086".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("ping").unwrap().as_str(),
            "http://metrics.local:8086/ping"
        );
    }

    #[tokio::test]
    async fn test_connect_and_write() {
        let (addr, mock) = start_mock_influx(AxumStatus::NO_CONTENT).await;
        let client = InfluxClient::connect(config_for(addr)).await.unwrap();

        let point = Point::new("user_operations")
            .tag("operation", "insert")
            .field("count", 10i64)
            .at(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        client.write(point).await.unwrap();

        let writes = mock.writes.lock().clone();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].body, "user_operations,operation=insert count=10i 1700000000");
        assert_eq!(writes[0].query.get("db").map(String::as_str), Some("metrics"));
        assert_eq!(writes[0].query.get("precision").map(String::as_str), Some("s"));
        // base64("grafana:grafana")
        assert_eq!(
            writes[0].authorization.as_deref(),
            Some("Basic Z3JhZmFuYTpncmFmYW5h")
        );

        client.close();
    }

    #[tokio::test]
    async fn test_write_without_credentials() {
        let (addr, mock) = start_mock_influx(AxumStatus::NO_CONTENT).await;
        let client = InfluxClient::new(InfluxConfig {
            username: String::new(),
            password: String::new(),
            ..config_for(addr)
        })
        .unwrap();

        client
            .write(Point::new("webapp").field("count", 1i64))
            .await
            .unwrap();

        assert!(mock.writes.lock()[0].authorization.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let (addr, _mock) = start_mock_influx(AxumStatus::NOT_FOUND).await;
        let client = InfluxClient::new(config_for(addr)).unwrap();

        let result = client.write(Point::new("webapp").field("count", 1i64)).await;

        match result {
            Err(MetricsError::Server { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("database not found"));
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_fails_when_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = InfluxClient::connect(config_for(addr)).await;
        assert!(matches!(result, Err(MetricsError::Http(_))));
    }

    #[tokio::test]
    async fn test_invalid_point_not_sent() {
        let (addr, mock) = start_mock_influx(AxumStatus::NO_CONTENT).await;
        let client = InfluxClient::new(config_for(addr)).unwrap();

        let result = client.write(Point::new("webapp")).await;

        assert!(matches!(result, Err(MetricsError::EmptyFields(_))));
        assert!(mock.writes.lock().is_empty());
    }
}
