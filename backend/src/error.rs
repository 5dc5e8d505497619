use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

use crate::storage::scoped_store::StorageError;
use crate::storage::validator::ValidationError;
use crate::tone::classifier::ToneError;

/// Request-level failures. Eye detector failures never reach this type;
/// the eye adapter swallows them and returns a default summary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(#[from] ValidationError),
    #[error("{0}")]
    StorageFailure(#[from] StorageError),
    #[error("{0}")]
    ClassificationFailure(#[from] ToneError),
    #[error("{0}")]
    InvalidRequest(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::StorageFailure(_) => StatusCode::BAD_REQUEST,
            ApiError::ClassificationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}
