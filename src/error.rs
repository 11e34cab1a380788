use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::MessageResponse;

/// RepoError
///
/// Failures raised by a [`Repository`](crate::repository::Repository) implementation.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("an account with this email already exists")]
    DuplicateEmail,
    #[error("store unavailable")]
    Unavailable,
}

/// ApiError
///
/// The complete failure taxonomy of the HTTP surface. Every handler returns
/// `Result<_, ApiError>`, so nothing crosses the route boundary without being mapped
/// to one of these variants and rendered as `{"msg": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Server error")]
    ServerError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn admin_required() -> Self {
        ApiError::Forbidden("Access denied: admin role required".to_string())
    }

    pub fn user_not_found() -> Self {
        ApiError::NotFound("User not found".to_string())
    }

    pub fn actualite_not_found() -> Self {
        ApiError::NotFound("Actualité non trouvée".to_string())
    }

    pub fn event_not_found() -> Self {
        ApiError::NotFound("Événement non trouvé".to_string())
    }

    pub fn invalid_category() -> Self {
        ApiError::BadRequest("Catégorie invalide".to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateEmail => ApiError::Conflict("User already exists".to_string()),
            other => ApiError::ServerError(other.to_string()),
        }
    }
}

// Malformed, mistyped or missing bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::ServerError(detail) = &self {
            // The detail stays in the logs; clients only get the generic message.
            tracing::error!(error = %detail, "request failed");
        } else {
            tracing::debug!(status = %status, msg = %self, "request rejected");
        }
        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}
