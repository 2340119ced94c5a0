use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{services::ServiceError, validate::FieldError};

/// ApiError
///
/// Every failure a handler can surface, with its HTTP translation. Each
/// variant maps to one JSON envelope carrying at least a `message` field;
/// validation failures additionally carry the ordered `errors` array.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authorization header absent or not of the `Bearer <token>` shape (401).
    #[error("No token provided")]
    MissingToken,
    /// A present token failed cryptographic verification (403).
    #[error("Invalid token")]
    InvalidToken,
    /// No principal attached, or the principal holds no roles at all (403).
    #[error("Access denied. No roles found.")]
    NoRoles,
    /// Roles present but the required role is missing (403).
    #[error("Access denied.")]
    InsufficientRole,
    /// The `author` field does not match the authenticated principal (403).
    #[error("Author mismatch")]
    AuthorMismatch,
    /// One or more field rules were violated (400).
    #[error("Validation errors")]
    Validation(Vec<FieldError>),
    /// A referenced entity is missing, or the request is otherwise unusable (400).
    #[error("{0}")]
    BadRequest(String),
    /// Entity absent for get/update/delete (404).
    #[error("{0}")]
    NotFound(String),
    /// Login failure. Covers both unknown email and wrong password with one
    /// indistinguishable message (401).
    #[error("Invalid credentials")]
    NotAuthorized,
    /// Anything infrastructural. The detail is logged server-side and the
    /// client only ever sees the masked message (500).
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingToken | ApiError::NotAuthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken
            | ApiError::NoRoles
            | ApiError::InsufficientRole
            | ApiError::AuthorMismatch => StatusCode::FORBIDDEN,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::Validation(errors) => Json(json!({
                "message": self.to_string(),
                "errors": errors,
            })),
            _ => Json(json!({ "message": self.to_string() })),
        };

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    /// Translates service outcomes at the controller boundary.
    ///
    /// `ReferenceNotFound` keeps its resource-specific wording; everything
    /// infrastructural is logged here and masked to the client.
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ReferenceNotFound(kind) => ApiError::BadRequest(format!("{kind} not found")),
            ServiceError::EmailTaken => ApiError::BadRequest("Email already in use".to_string()),
            ServiceError::NotAuthorized => ApiError::NotAuthorized,
            ServiceError::Store(e) => {
                tracing::error!("store error: {e:?}");
                ApiError::Internal
            }
            ServiceError::Hash(e) => {
                tracing::error!("password hashing error: {e:?}");
                ApiError::Internal
            }
            ServiceError::Token(e) => {
                tracing::error!("token signing error: {e:?}");
                ApiError::Internal
            }
        }
    }
}
