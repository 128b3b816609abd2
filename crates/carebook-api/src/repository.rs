//! Shared repository plumbing
//!
//! Error type and locking helper used by every store in the crate.

use crate::error::AppError;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("In-memory store lock poisoned")]
    LockPoisoned,
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Lock an in-memory store, surfacing poisoning as an error
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex.lock().map_err(|_| RepositoryError::LockPoisoned)
}
