//! Route-boundary error mapping.
//!
//! Handlers return `ApiError` for every failure. Clients only ever see a
//! status and a static message; details go to the log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 with a plain-text message.
    #[error("{0}")]
    BadRequest(&'static str),
    /// 500 with a plain-text message.
    #[error("{0}")]
    Internal(&'static str),
    /// 500 with `{"error": "Internal server error."}`.
    #[error("Internal server error.")]
    InternalJson,
    /// 501 with a plain-text message.
    #[error("{0}")]
    NotImplemented(&'static str),
}

impl ApiError {
    /// Log `err` with its context chain and turn it into a plain 500.
    pub fn internal(message: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{message}");
        Self::Internal(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) | Self::InternalJson => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::InternalJson => {
                (status, Json(json!({ "error": INTERNAL_SERVER_ERROR }))).into_response()
            }
            Self::BadRequest(message) | Self::Internal(message) | Self::NotImplemented(message) => {
                (status, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::BadRequest("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InternalJson.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::NotImplemented("x").status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn test_json_error_response() {
        let response = ApiError::InternalJson.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_plain_error_response() {
        let response = ApiError::internal("Error executing query.", "no such table: x").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    }
}
