/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - AclError / ContainerError を統一的に変換 (malformed → 400, denied → 403)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::acl::{AclError, ContainerError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] AclError),
    #[error("access denied: {0}")]
    AccessDenied(#[source] AclError),
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::MalformedRequest(err) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", err.to_string())
            }
            AppError::AccessDenied(err) => (StatusCode::FORBIDDEN, "ACCESS_DENIED", err.to_string()),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AclError> for AppError {
    fn from(e: AclError) -> Self {
        if e.is_malformed_request() {
            AppError::MalformedRequest(e)
        } else {
            AppError::AccessDenied(e)
        }
    }
}

impl From<ContainerError> for AppError {
    fn from(e: ContainerError) -> Self {
        match e {
            ContainerError::NotFound(_) => AppError::not_found("container"),
            ContainerError::Backend(err) => {
                tracing::error!(error = ?err, "container lookup failed");
                AppError::Internal
            }
        }
    }
}
