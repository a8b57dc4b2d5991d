use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::TtsError;

/// Errors returned to HTTP clients as `{"error": "<message>"}`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The request was malformed or failed validation.
    #[error("{0}")]
    BadRequest(String),
    /// The model, a voice, or the encoder failed.
    #[error(transparent)]
    Engine(#[from] TtsError),
    /// A blocking task panicked or was cancelled.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use crate::TtsError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn validation_errors_are_client_errors() {
        let err = ApiError::BadRequest("Missing 'text' field".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing 'text' field");
    }

    #[test]
    fn engine_errors_are_server_errors_with_message() {
        let err = ApiError::from(TtsError::Generation("out of memory".to_string()));
        assert_eq!(err.to_string(), "Speech generation failed: out of memory");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
