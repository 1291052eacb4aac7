use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// RepositoryError
///
/// Failures surfaced by the persistence layer. A unique violation on the user
/// email is singled out because it is a client mistake, not an outage.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("email address already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

impl RepositoryError {
    /// Maps a failed `users` insert, recognising the unique email constraint.
    pub fn from_user_insert(err: sqlx::Error) -> Self {
        let duplicate = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION);
        if duplicate {
            Self::DuplicateEmail
        } else {
            Self::Database(err)
        }
    }
}

/// ApiError
///
/// Every way a request can fail, each mapped to one status code and JSON body.
/// Handlers return `Result<_, ApiError>` and never build error responses by hand.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// Model rule violations, reported under `error`.
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),
    /// Presence pre-check failures on update, reported under `message`.
    #[error("invalid fields: {0:?}")]
    InvalidFields(Vec<String>),
    /// A JSON body that does not parse or does not match the payload's types.
    #[error("malformed body: {0}")]
    MalformedBody(String),
    #[error("access denied")]
    Unauthorized,
    #[error("not the owner")]
    Forbidden,
    #[error("{0} Not Found.")]
    NotFound(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidFields(_) | Self::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(messages) => json!({ "error": messages }),
            Self::InvalidFields(messages) => json!({ "message": messages }),
            Self::MalformedBody(detail) => json!({ "message": detail }),
            Self::Unauthorized => json!({ "message": "Access Denied" }),
            Self::Forbidden => json!({ "message": "User is Not Authorized." }),
            Self::NotFound(resource) => json!({ "message": format!("{} Not Found.", resource) }),
            Self::Internal(detail) => {
                // The detail stays in the logs; clients get a fixed message.
                tracing::error!("request failed: {}", detail);
                json!({ "message": "Internal Server Error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail => {
                Self::Validation(vec!["emailAddress must be unique".to_string()])
            }
            RepositoryError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Internal(format!("password hashing failed: {}", err))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {}", err))
    }
}
