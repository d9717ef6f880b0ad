use thiserror::Error;
use tracing::error;

use warbler_auth::AuthError;
use warbler_db::DbError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No logged-in user, or the user may not touch this resource.
    #[error("Access unauthorized.")]
    Unauthorized,

    #[error("Forbidden.")]
    Forbidden,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    /// The write hit a uniqueness or reference constraint.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::NotFound(entity),
            DbError::Integrity(msg) => ApiError::Conflict(msg),
            other => {
                error!("Database error: {}", other);
                ApiError::Internal(other.into())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Db(e) => e.into(),
            other => {
                error!("Auth error: {}", other);
                ApiError::Internal(other.into())
            }
        }
    }
}
