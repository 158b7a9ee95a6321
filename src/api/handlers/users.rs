use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::operations;
use crate::models::{seed_batch, User};
use crate::utils::response::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertUsersResponse {
    pub message: String,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUsersResponse {
    pub message: String,
    pub deleted_count: u64,
}

/// List every stored user
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.users.list().await.map_err(|e| {
        tracing::error!("Failed to list users: {}", e);
        AppError::internal()
    })?;

    Ok(Json(users))
}

/// Insert the fixed seed batch; any request body is ignored
pub async fn create_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsertUsersResponse>, AppError> {
    let batch = seed_batch();
    let count = batch.len();

    let user_ids = state.users.insert_many(batch).await.map_err(|e| {
        tracing::error!("Failed to insert users: {}", e);
        AppError::internal()
    })?;

    state
        .metrics
        .record_user_operation(operations::INSERT, count as u64)
        .await;

    tracing::debug!("Inserted {} users", user_ids.len());

    Ok(Json(InsertUsersResponse {
        message: format!("{} users inserted successfully", count),
        user_ids,
    }))
}

/// Delete every stored user
pub async fn delete_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeleteUsersResponse>, AppError> {
    let deleted_count = state.users.delete_all().await.map_err(|e| {
        tracing::error!("Failed to delete users: {}", e);
        AppError::internal()
    })?;

    state
        .metrics
        .record_user_operation(operations::DELETE, deleted_count)
        .await;

    tracing::debug!("Deleted {} users", deleted_count);

    Ok(Json(DeleteUsersResponse {
        message: "All users deleted successfully".to_string(),
        deleted_count,
    }))
}
