use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness only; backends are not consulted
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "up" })
}
