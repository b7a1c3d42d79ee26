// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use options_envelope::EnvelopeError;
use serde_json::json;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("unable to encrypt response: {0}")]
    EncryptionFailure(String),
    #[error("unable to obtain upstream credential: {0}")]
    AuthFailure(String),
    #[error("upstream request failed: {0}")]
    UpstreamFailure(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("invalid verification token")]
    Unauthorized,
    #[error("option source not found: {0}")]
    SourceNotFound(String),
    #[error("internal server error")]
    InternalServerError,
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::EncryptionFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to encrypt response".to_string(),
            ),
            Self::AuthFailure(_) => (
                StatusCode::BAD_GATEWAY,
                "Unable to authenticate upstream".to_string(),
            ),
            Self::UpstreamFailure(_) => (
                StatusCode::BAD_GATEWAY,
                "Upstream request failed".to_string(),
            ),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid verification token".to_string(),
            ),
            Self::SourceNotFound(name) => (
                StatusCode::NOT_FOUND,
                format!("Unknown option source: {name}"),
            ),
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
            Self::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({"code": status.as_u16(), "message": message}));

        (status, body).into_response()
    }
}

impl From<EnvelopeError> for AppError {
    fn from(source: EnvelopeError) -> Self {
        tracing::error!("[server] envelope error: {:?}", source);
        AppError::EncryptionFailure(source.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(_source: serde_json::Error) -> Self {
        tracing::error!("{:?}", _source);
        AppError::InternalServerError
    }
}
