//! Application configuration
//!
//! Every value has a built-in default matching the docker-compose deployment;
//! environment variables (optionally from a `.env` file) override them.

use ::config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

use crate::metrics::influx::InfluxConfig;

pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const MONGO_URI: &str = "mongodb://mongodb:27017";
    pub const MONGO_DATABASE: &str = "main";
    pub const MONGO_COLLECTION: &str = "users";
    pub const INFLUX_URL: &str = "http://influxdb:8086";
    pub const INFLUX_DATABASE: &str = "metrics";
    pub const INFLUX_USER: &str = "grafana";
    pub const INFLUX_PASSWORD: &str = "grafana";
    pub const INFLUX_TIMEOUT_MS: u64 = 5000;
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_collection: String,
    pub influx_url: String,
    pub influx_database: String,
    pub influx_user: String,
    pub influx_password: String,
    pub influx_timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from defaults overlaid with environment variables
    /// (`PORT`, `MONGO_URI`, `INFLUX_URL`, ...).
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::default())
    }

    /// Values stay strings until deserialized, so numeric-looking
    /// passwords or names are kept verbatim.
    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Self::builder()?.add_source(env).build()?.try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("port", defaults::PORT as i64)?
            .set_default("mongo_uri", defaults::MONGO_URI)?
            .set_default("mongo_database", defaults::MONGO_DATABASE)?
            .set_default("mongo_collection", defaults::MONGO_COLLECTION)?
            .set_default("influx_url", defaults::INFLUX_URL)?
            .set_default("influx_database", defaults::INFLUX_DATABASE)?
            .set_default("influx_user", defaults::INFLUX_USER)?
            .set_default("influx_password", defaults::INFLUX_PASSWORD)?
            .set_default("influx_timeout_ms", defaults::INFLUX_TIMEOUT_MS as i64)
    }

    pub fn influx_config(&self) -> InfluxConfig {
        InfluxConfig {
            url: self.influx_url.clone(),
            database: self.influx_database.clone(),
            username: self.influx_user.clone(),
            password: self.influx_password.clone(),
            timeout_ms: self.influx_timeout_ms,
        }
    }
}
