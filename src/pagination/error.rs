use thiserror::Error;

/// Failure categories of a paginated query. Callers map each one to its own status.
#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("{0}")]
    Validation(String),
    #[error("Database operational error: {0}")]
    Storage(#[source] sqlx::Error),
    #[error("An unexpected error occurred: {0}")]
    Internal(#[source] anyhow::Error),
}

impl PaginationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<sqlx::Error> for PaginationError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Storage(err),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_storage_errors() {
        assert!(matches!(
            PaginationError::from(sqlx::Error::PoolTimedOut),
            PaginationError::Storage(_)
        ));
        assert!(matches!(
            PaginationError::from(sqlx::Error::PoolClosed),
            PaginationError::Storage(_)
        ));
    }

    #[test]
    fn decoding_failures_are_internal_errors() {
        let err = PaginationError::from(sqlx::Error::ColumnNotFound("email".into()));
        assert!(matches!(err, PaginationError::Internal(_)));
        assert!(err.to_string().starts_with("An unexpected error occurred"));
    }
}
