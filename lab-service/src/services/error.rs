use service_core::error::AppError;
use thiserror::Error;

use super::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Identifier already registered")]
    DuplicateIdentifier,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Part number already registered")]
    DuplicatePartNumber,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::DuplicateIdentifier => {
                AppError::BadRequest(anyhow::anyhow!("Identifier already registered"))
            }
            ServiceError::InvalidCredentials => {
                AppError::BadRequest(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::InvalidToken => AppError::BadRequest(anyhow::anyhow!("Invalid token")),
            ServiceError::ExpiredToken => AppError::BadRequest(anyhow::anyhow!("Token expired")),
            ServiceError::DuplicatePartNumber => {
                AppError::BadRequest(anyhow::anyhow!("Part number already registered"))
            }
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Store(StoreError::Database(e)) => AppError::from(e),
            ServiceError::Store(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_lifecycle_errors_are_bad_requests() {
        for err in [
            ServiceError::DuplicateIdentifier,
            ServiceError::InvalidCredentials,
            ServiceError::InvalidToken,
            ServiceError::ExpiredToken,
            ServiceError::DuplicatePartNumber,
        ] {
            assert_eq!(AppError::from(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_not_found_and_store_failures() {
        assert_eq!(
            AppError::from(ServiceError::NotFound("Account".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ServiceError::Store(StoreError::Internal("poisoned".into())))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
