pub mod manager;
pub mod models;
pub mod postgres;
pub mod storage;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::QUERY_TIMEOUT;

pub use manager::DatabaseManager;
pub use storage::{CategoryStore, Storage, TransactionStore, UserStore};

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource not found")]
    NotFound,

    #[error("a user with that email already exists")]
    DuplicateEmail,

    #[error("a user with that username already exists")]
    DuplicateUsername,

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps `RowNotFound` to `NotFound`, leaving other errors untouched.
    pub fn from_row(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Sqlx(other),
        }
    }
}

/// Runs a store call under the per-query deadline.
pub async fn with_timeout<T, F>(fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(QUERY_TIMEOUT, fut)
        .await
        .map_err(|_| StoreError::Timeout(QUERY_TIMEOUT))?
}
