//! Orders, projects and reservations share one storage model; each gets
//! its own pair of routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{Map, Value};
use service_core::error::AppError;

use crate::{
    dtos::ErrorResponse,
    middleware::AuthUser,
    models::{Record, RecordKind},
    AppState,
};

type Payload = Result<Json<Map<String, Value>>, JsonRejection>;

async fn list(state: &AppState, kind: RecordKind) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.record_service.list(kind).await?))
}

async fn create(
    state: &AppState,
    kind: RecordKind,
    user: AuthUser,
    payload: Payload,
) -> Result<Json<Record>, AppError> {
    let Json(data) = payload
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e.body_text())))?;
    let record = state
        .record_service
        .create(kind, Value::Object(data), &user.0.sub)
        .await?;
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders, oldest first", body = [Record]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Records",
    security(("bearer_auth" = []))
)]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Record>>, AppError> {
    list(&state, RecordKind::Order).await
}

#[utoipa::path(
    post,
    path = "/api/orders",
    responses(
        (status = 200, description = "Order stored", body = Record),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse)
    ),
    tag = "Records",
    security(("bearer_auth" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Payload,
) -> Result<Json<Record>, AppError> {
    create(&state, RecordKind::Order, user, payload).await
}

#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Projects, oldest first", body = [Record]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Records",
    security(("bearer_auth" = []))
)]
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Record>>, AppError> {
    list(&state, RecordKind::Project).await
}

#[utoipa::path(
    post,
    path = "/api/projects",
    responses(
        (status = 200, description = "Project stored", body = Record),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse)
    ),
    tag = "Records",
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Payload,
) -> Result<Json<Record>, AppError> {
    create(&state, RecordKind::Project, user, payload).await
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    responses(
        (status = 200, description = "Reservations, oldest first", body = [Record]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Records",
    security(("bearer_auth" = []))
)]
pub async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Record>>, AppError> {
    list(&state, RecordKind::Reservation).await
}

#[utoipa::path(
    post,
    path = "/api/reservations",
    responses(
        (status = 200, description = "Reservation stored", body = Record),
        (status = 400, description = "Body is not a JSON object", body = ErrorResponse)
    ),
    tag = "Records",
    security(("bearer_auth" = []))
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Payload,
) -> Result<Json<Record>, AppError> {
    create(&state, RecordKind::Reservation, user, payload).await
}
