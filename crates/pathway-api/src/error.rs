use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use pathway_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field was missing or empty after trimming.
    #[error("{0}")]
    Validation(&'static str),

    #[error("Deletion must be confirmed with X-Delete-Confirm: DELETE.")]
    Confirmation,

    /// Same message whether the credential was wrong or missing.
    #[error("Forbidden.")]
    Forbidden,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Internal server error.")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Confirmation => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!("Request failed: {:#}", e);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
