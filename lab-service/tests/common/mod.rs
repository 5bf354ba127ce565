//! Shared setup for lab-service integration tests.
//!
//! Every test gets a router over a fresh `MemoryStore` and a recording
//! notifier, driven in-process with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lab_service::{
    build_router,
    config::{
        Environment, JwtConfig, LabConfig, PasswordResetConfig, RateLimitConfig, SecurityConfig,
        StorageBackend, SwaggerConfig,
    },
    models::Role,
    services::{MemoryStore, MockNotifier},
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "segredo123";

pub fn test_config() -> LabConfig {
    LabConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "lab-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        storage: StorageBackend::Memory,
        database: None,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_minutes: 60,
        },
        password_reset: PasswordResetConfig {
            token_ttl_minutes: 60,
            log_tokens: false,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig { enabled: false },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            register_attempts: 100,
            register_window_seconds: 60,
            password_reset_attempts: 100,
            password_reset_window_seconds: 60,
            trust_forwarded_for: false,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<MockNotifier>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with(test_config())
    }

    pub fn spawn_with(config: LabConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MockNotifier::new());
        let state = AppState::with_store(config, store.clone(), notifier.clone());
        let router = build_router(state.clone());

        TestApp {
            router,
            state,
            store,
            notifier,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("valid request")).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register through the API and return the session token.
    pub async fn register(&self, identifier: &str, roles: Option<Vec<Role>>) -> String {
        let mut body = json!({
            "gmail": identifier,
            "nome": "Usuário Teste",
            "senha": TEST_PASSWORD,
        });
        if let Some(roles) = roles {
            body["roles"] = json!(roles);
        }

        let res = self.post("/api/auth/register", None, body).await;
        assert_eq!(res.status, StatusCode::OK, "register failed: {}", res.body);
        res.body["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    pub async fn login(&self, identifier: &str, password: &str) -> TestResponse {
        self.post(
            "/api/auth/login",
            None,
            json!({ "gmail": identifier, "senha": password }),
        )
        .await
    }

    pub async fn academico_token(&self) -> String {
        self.register("academico@gmail.com", None).await
    }

    pub async fn professor_token(&self) -> String {
        self.register("professor@gmail.com", Some(vec![Role::Professor])).await
    }

    pub async fn admin_token(&self) -> String {
        self.register("admin@gmail.com", Some(vec![Role::Admin])).await
    }
}
