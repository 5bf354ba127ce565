use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{users::DeviceTokenRequest, ErrorResponse},
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Notifications for the caller (none are produced yet)
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Always an empty list"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(_user: AuthUser) -> impl IntoResponse {
    Json(Vec::<serde_json::Value>::new())
}

/// Store the push-notification device token of the caller
#[utoipa::path(
    post,
    path = "/api/notifications/device-token",
    request_body = DeviceTokenRequest,
    responses(
        (status = 200, description = "Device token stored"),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
pub async fn register_device_token(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<DeviceTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .account_service
        .register_device_token(&user.0.sub, &req.device_token)
        .await?;
    Ok(StatusCode::OK)
}
