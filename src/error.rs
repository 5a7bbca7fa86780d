//! Error taxonomy for the request boundary and the storage layer.
//!
//! Every failure a handler can produce ends up as an [`ApiError`], which renders as
//! `{"error": "<message>"}` with the matching status code.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use validator::{Validate, ValidationErrors};

/// Application-level errors, one variant per HTTP outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// A required path segment or body field is missing or malformed
    BadRequest(String),
    /// No admin credential was presented
    Unauthorized(String),
    /// A credential was presented but does not match the bundle
    Forbidden(String),
    /// Bundle or link absent, or link owned by another bundle
    NotFound(String),
    /// Uniqueness violation in storage
    Conflict(String),
    /// Anything else; the message is logged, never sent to the client
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn bundle_not_found() -> Self {
        ApiError::NotFound("Bundle not found".into())
    }

    pub fn link_not_found() -> Self {
        ApiError::NotFound("Link not found".into())
    }

    pub fn missing_token() -> Self {
        ApiError::Unauthorized("Admin token required".into())
    }

    pub fn invalid_token() -> Self {
        ApiError::Forbidden("Invalid admin token".into())
    }

    pub fn missing_slug() -> Self {
        ApiError::BadRequest("Bundle slug required".into())
    }

    pub fn invalid_slug() -> Self {
        ApiError::BadRequest("Invalid bundle slug".into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                "Internal server error".to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg,
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Storage-layer failures, classified just enough for the request boundary to map them.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoError {
    /// A unique constraint rejected the write (slug or admin token collision)
    Conflict(String),
    /// A foreign key rejected the write; the owning bundle no longer exists
    MissingParent,
    Database(String),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::Conflict(msg) => write!(f, "unique violation: {}", msg),
            RepoError::MissingParent => write!(f, "owning bundle does not exist"),
            RepoError::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for RepoError {}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    tracing::warn!("unique violation: {}", db_err.message());
                    return RepoError::Conflict(db_err.message().to_string());
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    tracing::warn!("foreign key violation: {}", db_err.message());
                    return RepoError::MissingParent;
                }
                _ => {}
            }
        }
        tracing::error!("database error: {:?}", err);
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(_) => {
                ApiError::Conflict("A bundle with this identifier already exists".into())
            }
            RepoError::MissingParent => ApiError::bundle_not_found(),
            RepoError::Database(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Invalid input: {}", errors))
    }
}

/// ApiJson
///
/// Drop-in replacement for `axum::Json` as a request extractor. Decoding failures and
/// failed `validator` checks both become `ApiError::BadRequest` with a JSON body, so no
/// untyped or unchecked input gets past the boundary.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ApiJson(value))
    }
}

/// ApiPath
///
/// `axum::extract::Path` with its rejection (for instance a segment that is not valid
/// UTF-8) rendered as a JSON `BadRequest` like every other error.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiPath(value))
    }
}
