use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    services::{authorize, Capability, GateError, SessionClaims, TokenError},
    AppState,
};

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Unauthorized => AppError::Unauthorized(anyhow::anyhow!("Authentication required")),
            GateError::Forbidden => AppError::Forbidden(anyhow::anyhow!("Insufficient role")),
        }
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the bearer token and stores its claims in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
    })?;

    let claims = state.jwt.verify(token).map_err(|e| {
        match e {
            TokenError::Expired => tracing::debug!("Rejected expired session token"),
            ref other => tracing::warn!(error = %other, "Rejected session token"),
        }
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Gate a router on a capability. Must run inside `auth_middleware`.
pub async fn require_capability(
    State(capability): State<Capability>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = req.extensions().get::<SessionClaims>();

    if let Err(e) = authorize(claims, &capability) {
        tracing::warn!(
            subject = claims.map(|c| c.sub.as_str()).unwrap_or("-"),
            path = %req.uri().path(),
            "Authorization denied"
        );
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

/// Claims of the authenticated caller.
pub struct AuthUser(pub SessionClaims);

impl AuthUser {
    /// Check an additional capability inside a handler.
    pub fn require(&self, capability: &Capability) -> Result<(), AppError> {
        authorize(Some(&self.0), capability).map_err(AppError::from)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
    }
}
