//! Handler Errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Errors returned by the dev server handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing embedtoken header")]
    MissingToken,

    #[error("Malformed reference: {0}")]
    InvalidReference(String),

    #[error("Payload could not be decoded: {0}")]
    InvalidPayload(String),

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: String },
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidReference(_) | Self::InvalidPayload(_) | Self::InvalidAmount { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(code = self.code(), "{}", self);
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        });
        (status, body).into_response()
    }
}
