use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use edubot_core::error::{ProgressError, ProviderError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Progress(ProgressError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Progress(ProgressError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Provider(ProviderError::AuthenticationFailed(_)) => StatusCode::UNAUTHORIZED,
            AppError::Provider(
                ProviderError::ApiError { .. }
                | ProviderError::ModelNotFound(_)
                | ProviderError::EmptyResponse,
            ) => StatusCode::BAD_GATEWAY,
            AppError::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
