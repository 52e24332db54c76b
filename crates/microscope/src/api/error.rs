// crates/microscope/src/api/error.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::models::{ErrorBody, PrettyJson};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid page {0:?}: expected a positive integer")]
    InvalidPage(String),

    #[error("invalid died_at {0:?}: expected an integer timestamp")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Store(e) => tracing::error!(error = %e, "store call failed"),
            other => tracing::warn!(error = %other, "rejected request"),
        }

        // every failure class shares one status
        PrettyJson(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                error: self.to_string(),
            },
        )
        .into_response()
    }
}
