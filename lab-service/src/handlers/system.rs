use axum::{extract::State, Json};
use chrono::Utc;
use service_core::error::AppError;

use crate::AppState;

/// Service health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Store is unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.account_service.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "UP",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "storage": format!("{:?}", state.config.storage),
        "timestamp": Utc::now(),
    })))
}

/// Echo endpoint for checking browser CORS setup
#[utoipa::path(
    get,
    path = "/api/cors-test",
    responses((status = 200, description = "CORS is working")),
    tag = "Observability"
)]
pub async fn cors_test() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "CORS is working",
        "timestamp": Utc::now(),
    }))
}
