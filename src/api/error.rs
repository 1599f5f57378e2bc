use crate::error::SignalError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError(pub SignalError);

impl From<SignalError> for ApiError {
    fn from(e: SignalError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SignalError::UnsupportedHorizon(_) => StatusCode::BAD_REQUEST,
            SignalError::EmptyHistory(_) => StatusCode::NOT_FOUND,
            SignalError::InsufficientHistory { .. } | SignalError::InvalidHistory(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SignalError::Http(_) | SignalError::DataSource(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        }
        let body = json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
