use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        components::{BarcodeQuery, CreateComponentRequest, SearchQuery},
        ErrorResponse,
    },
    middleware::AuthUser,
    models::Component,
    services::policy::COMPONENT_WRITERS,
    utils::ValidatedJson,
    AppState,
};

/// Add a component to the catalog
#[utoipa::path(
    post,
    path = "/api/components",
    request_body = CreateComponentRequest,
    responses(
        (status = 200, description = "Component created", body = Component),
        (status = 400, description = "Part number already registered or validation error", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Professor or administrator role required", body = ErrorResponse)
    ),
    tag = "Components",
    security(("bearer_auth" = []))
)]
pub async fn create_component(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateComponentRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&COMPONENT_WRITERS)?;
    let component = state.component_service.create(req.into()).await?;
    Ok(Json(component))
}

/// List the whole catalog
#[utoipa::path(
    get,
    path = "/api/components",
    responses(
        (status = 200, description = "Components", body = [Component]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Components",
    security(("bearer_auth" = []))
)]
pub async fn list_components(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.component_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/components/{id}",
    params(("id" = i64, Path, description = "Component id")),
    responses(
        (status = 200, description = "Component", body = Component),
        (status = 404, description = "Component not found", body = ErrorResponse)
    ),
    tag = "Components",
    security(("bearer_auth" = []))
)]
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.component_service.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/components/part-number/{part_number}",
    params(("part_number" = String, Path, description = "Manufacturer part number")),
    responses(
        (status = 200, description = "Component", body = Component),
        (status = 404, description = "Component not found", body = ErrorResponse)
    ),
    tag = "Components",
    security(("bearer_auth" = []))
)]
pub async fn get_component_by_part_number(
    State(state): State<AppState>,
    Path(part_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state
            .component_service
            .get_by_part_number(&part_number)
            .await?,
    ))
}

/// Search by name, part number or manufacturer
#[utoipa::path(
    get,
    path = "/api/components/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching components", body = [Component])
    ),
    tag = "Components",
    security(("bearer_auth" = []))
)]
pub async fn search_components(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.component_service.search(&query.q).await?))
}

#[utoipa::path(
    get,
    path = "/api/components/category/{category}",
    params(("category" = String, Path, description = "Catalog category")),
    responses(
        (status = 200, description = "Components in the category", body = [Component])
    ),
    tag = "Components",
    security(("bearer_auth" = []))
)]
pub async fn components_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.component_service.by_category(&category).await?))
}

/// Barcode lookup (no catalog integration yet)
#[utoipa::path(
    get,
    path = "/api/components/by-barcode",
    params(BarcodeQuery),
    responses(
        (status = 200, description = "Component", body = Component),
        (status = 204, description = "No component for this barcode")
    ),
    tag = "Components",
    security(("bearer_auth" = []))
)]
pub async fn component_by_barcode(
    State(state): State<AppState>,
    Query(query): Query<BarcodeQuery>,
) -> Result<Response, AppError> {
    match state.component_service.by_barcode(&query.code).await? {
        Some(component) => Ok(Json(component).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
