use thiserror::Error;

use crate::pagination::PaginationError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("This email is already used")]
    Conflict,
    #[error("Password is incorrect")]
    InvalidCredentials,
    #[error("Old password is incorrect.")]
    IncorrectPassword,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
