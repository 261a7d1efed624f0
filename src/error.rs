use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The request-level error taxonomy. Every handler failure maps onto exactly one
/// variant, and every variant maps onto exactly one HTTP status. Internal detail
/// never reaches the client; store failures are logged server-side and surface
/// as a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session, or a malformed/expired session token. Both are treated identically.
    #[error("authentication required")]
    Unauthorized,

    /// A session is present but the role is insufficient for the route.
    #[error("insufficient permissions")]
    Forbidden,

    /// The named entity does not exist, or is not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A required field is missing or an invariant on the payload is violated.
    #[error("{0}")]
    Validation(String),

    /// A unique-key collision (e.g., duplicate email at registration).
    #[error("{0}")]
    Conflict(String),

    /// A persistence-layer failure. Details live in the server log only.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<sqlx::Error> for ApiError {
    /// Classifies database errors into the taxonomy. Unique violations become
    /// Conflict, foreign-key violations and missing rows become NotFound, and
    /// anything else is logged and reported as a generic Internal error.
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("record"),
            sqlx::Error::Database(db) => match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    ApiError::Conflict("a record with this unique value already exists".to_string())
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    ApiError::NotFound("referenced record")
                }
                _ => {
                    tracing::error!("database error: {:?}", err);
                    ApiError::Internal
                }
            },
            _ => {
                tracing::error!("database error: {:?}", err);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicate unique keys are reported as 400 alongside validation
            // failures, matching the public API contract.
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
