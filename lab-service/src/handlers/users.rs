use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        users::{CreateUserRequest, UpdateRolesRequest, UpdateUserRequest},
        ErrorResponse,
    },
    middleware::AuthUser,
    models::AccountResponse,
    utils::ValidatedJson,
    AppState,
};

/// Profile of the authenticated caller
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current profile", body = AccountResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.account_service.me(&user.0.sub).await?;
    Ok(Json(profile))
}

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Accounts", body = [AccountResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.account_service.list().await?))
}

/// Create an account on behalf of someone
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Account created", body = AccountResponse),
        (status = 400, description = "Identifier already registered or validation error", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.account_service.create(req).await?))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.account_service.update(id, req).await?))
}

/// Delete an account
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.account_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the roles of an account
#[utoipa::path(
    put,
    path = "/api/users/{id}/roles",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UpdateRolesRequest,
    responses(
        (status = 200, description = "Roles updated", body = AccountResponse),
        (status = 400, description = "Empty role set", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_roles(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateRolesRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.account_service.update_roles(id, req.roles).await?))
}
