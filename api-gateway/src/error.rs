//! Error handling for the API gateway
//!
//! Handlers return `Result<_, ApiError>`, so an error is always a hard
//! early return: no handler can emit an error envelope and then keep
//! executing against missing state.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::api::response::ApiResponse;

/// API errors
#[derive(Debug, thiserror::Error)]
#[allow(dead_code)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("{0}")]
    Common(#[from] common::error::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();

        // Log the error with request ID for backend tracing
        tracing::error!("API Error [{}]: {:?}", request_id, &self);

        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                common::error::Error::AccountNotFound(_) => StatusCode::NOT_FOUND,
                common::error::Error::InvalidAmount(_) => StatusCode::BAD_REQUEST,

                // Server errors (5xx); a store failure always means the
                // atomic unit was rolled back, so the caller may retry
                common::error::Error::ConfigurationError(_)
                | common::error::Error::Internal(_)
                | common::error::Error::Database(_)
                | common::error::Error::Migration(_)
                | common::error::Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        let body = ApiResponse::<()>::error(self.to_string());

        (status, Json(body)).into_response()
    }
}
