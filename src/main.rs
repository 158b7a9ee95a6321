use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod db;
mod metrics;
mod models;
mod utils;

#[cfg(test)]
mod testing;

use crate::config::AppConfig;
use crate::db::{Database, MongoUserStore, UserStore};
use crate::metrics::influx::InfluxClient;
use crate::metrics::Metrics;

pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub metrics: Metrics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webapp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;

    tracing::info!("Starting webapp v{}", env!("CARGO_PKG_VERSION"));

    // Metrics sink first: every request depends on it
    let influx = Arc::new(
        InfluxClient::connect(config.influx_config())
            .await
            .context("Error initializing InfluxDB client")?,
    );

    let db = Database::connect(
        &config.mongo_uri,
        &config.mongo_database,
        &config.mongo_collection,
    )
    .await
    .context("Error initializing MongoDB")?;
    tracing::info!(
        "Connected to MongoDB (database: {}, collection: {})",
        config.mongo_database,
        config.mongo_collection
    );

    let state = Arc::new(AppState {
        users: Arc::new(MongoUserStore::new(&db)),
        metrics: Metrics::new(influx.clone()),
    });

    let app = api::routes::create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server is running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, closing backend connections");
    db.shutdown().await;
    match Arc::try_unwrap(influx) {
        Ok(client) => client.close(),
        Err(_) => tracing::warn!("InfluxDB client still referenced at shutdown"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
