//! Persistence gateway. Handlers and services only see these traits; the
//! concrete backend is chosen once in `main` and shared through `AppState`.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    tasks::repo_types::{NewTask, Task, TaskChanges, TaskStatus},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact match on the already-normalized email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::UniqueViolation`] when the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<User>;
}

/// Every method takes the owner id; no task is reachable by id alone.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Task>>;

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>>;

    async fn insert(&self, owner: Uuid, task: &NewTask) -> StoreResult<Task>;

    /// Applies only the `Some` fields. `None` when no task matches `(id, owner)`.
    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: &TaskChanges,
    ) -> StoreResult<Option<Task>>;

    /// `false` when no task matches `(id, owner)`.
    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<bool>;

    /// Counts the owner's tasks, optionally restricted to one status.
    async fn count(&self, owner: Uuid, status: Option<TaskStatus>) -> StoreResult<i64>;
}
