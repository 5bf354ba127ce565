pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::LabConfig;
use crate::middleware::{auth_middleware, require_capability};
use crate::services::{
    policy::ADMINISTRATORS, AccountService, AccountStore, ComponentService, ComponentStore,
    JwtService, RecordService, RecordStore, ResetNotifier,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::system::health_check,
        handlers::system::cors_test,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::users::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::update_roles,
        handlers::components::create_component,
        handlers::components::list_components,
        handlers::components::get_component,
        handlers::components::get_component_by_part_number,
        handlers::components::search_components,
        handlers::components::components_by_category,
        handlers::components::component_by_barcode,
        handlers::records::list_orders,
        handlers::records::create_order,
        handlers::records::list_projects,
        handlers::records::create_project,
        handlers::records::list_reservations,
        handlers::records::create_reservation,
        handlers::notifications::list_notifications,
        handlers::notifications::register_device_token,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::ForgotPasswordRequest,
            dtos::auth::ResetPasswordRequest,
            dtos::auth::TokenResponse,
            dtos::users::CreateUserRequest,
            dtos::users::UpdateUserRequest,
            dtos::users::UpdateRolesRequest,
            dtos::users::DeviceTokenRequest,
            dtos::components::CreateComponentRequest,
            models::AccountResponse,
            models::Component,
            models::Record,
            models::Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password reset"),
        (name = "Users", description = "Profiles and account administration"),
        (name = "Components", description = "Component catalog"),
        (name = "Records", description = "Orders, projects and reservations"),
        (name = "Notifications", description = "Notification feed and device tokens"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: LabConfig,
    pub jwt: JwtService,
    pub account_service: AccountService,
    pub component_service: ComponentService,
    pub record_service: RecordService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
    pub password_reset_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        config: LabConfig,
        accounts: Arc<dyn AccountStore>,
        components: Arc<dyn ComponentStore>,
        records: Arc<dyn RecordStore>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let account_service = AccountService::new(
            accounts,
            jwt.clone(),
            notifier,
            config.password_reset.token_ttl(),
        );

        let limits = &config.rate_limit;
        let limiter = |attempts, window_seconds| {
            create_ip_rate_limiter(attempts, window_seconds)
                .trust_forwarded_for(limits.trust_forwarded_for)
        };
        let login_rate_limiter = limiter(limits.login_attempts, limits.login_window_seconds);
        let register_rate_limiter =
            limiter(limits.register_attempts, limits.register_window_seconds);
        let password_reset_rate_limiter = limiter(
            limits.password_reset_attempts,
            limits.password_reset_window_seconds,
        );

        Self {
            jwt,
            account_service,
            component_service: ComponentService::new(components),
            record_service: RecordService::new(records),
            login_rate_limiter,
            register_rate_limiter,
            password_reset_rate_limiter,
            config,
        }
    }

    /// One store backing accounts, components and records.
    pub fn with_store<S>(config: LabConfig, store: Arc<S>, notifier: Arc<dyn ResetNotifier>) -> Self
    where
        S: AccountStore + ComponentStore + RecordStore + 'static,
    {
        Self::new(config, store.clone(), store.clone(), store, notifier)
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

pub fn build_router(state: AppState) -> Router {
    // Public auth routes, each behind its own per-IP limiter
    let register_route = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let login_route = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let reset_routes = Router::new()
        .route("/api/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password))
        .layer(from_fn_with_state(
            state.password_reset_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let authenticated_routes = Router::new()
        .route("/api/users/me", get(handlers::users::get_me))
        .route(
            "/api/components",
            get(handlers::components::list_components).post(handlers::components::create_component),
        )
        .route("/api/components/search", get(handlers::components::search_components))
        .route(
            "/api/components/by-barcode",
            get(handlers::components::component_by_barcode),
        )
        .route(
            "/api/components/category/:category",
            get(handlers::components::components_by_category),
        )
        .route(
            "/api/components/part-number/:part_number",
            get(handlers::components::get_component_by_part_number),
        )
        .route("/api/components/:id", get(handlers::components::get_component))
        .route(
            "/api/orders",
            get(handlers::records::list_orders).post(handlers::records::create_order),
        )
        .route(
            "/api/projects",
            get(handlers::records::list_projects).post(handlers::records::create_project),
        )
        .route(
            "/api/reservations",
            get(handlers::records::list_reservations).post(handlers::records::create_reservation),
        )
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/api/notifications/device-token",
            post(handlers::notifications::register_device_token),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/:id",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route("/api/users/:id/roles", put(handlers::users::update_roles))
        .layer(from_fn_with_state(ADMINISTRATORS, require_capability))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let mut app = Router::new()
        .route("/api/health", get(handlers::system::health_check))
        .route("/api/cors-test", get(handlers::system::cors_test));

    if state.config.swagger.enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    app.merge(register_route)
        .merge(login_route)
        .merge(reset_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .fallback(|| async { AppError::NotFound(anyhow::anyhow!("Route not found")) })
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}
