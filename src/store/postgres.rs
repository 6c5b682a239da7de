use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::{
    auth::repo_types::User,
    tasks::repo_types::{NewTask, Task, TaskChanges, TaskRow, TaskStatus},
};

const TASK_COLUMNS: &str = "id, user_id, title, description, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(options: PgConnectOptions) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn into_task(row: TaskRow) -> StoreResult<Task> {
    Task::try_from(row).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(into_task).collect()
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_task).transpose()
    }

    async fn insert(&self, owner: Uuid, task: &NewTask) -> StoreResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .fetch_one(&self.db)
        .await?;
        into_task(row)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: &TaskChanges,
    ) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
               SET title       = COALESCE($3, title),
                   description = COALESCE($4, description),
                   status      = COALESCE($5, status),
                   updated_at  = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.status.map(TaskStatus::as_str))
        .fetch_optional(&self.db)
        .await?;
        row.map(into_task).transpose()
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, owner: Uuid, status: Option<TaskStatus>) -> StoreResult<i64> {
        let count: i64 = match status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status = $2")
                    .bind(owner)
                    .bind(status.as_str())
                    .fetch_one(&self.db)
                    .await?
            }
            None => sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
                .bind(owner)
                .fetch_one(&self.db)
                .await?,
        };
        Ok(count)
    }
}

// Run with `DATABASE_URL=postgres://... cargo test -- --ignored`; each test
// gets a fresh database with `./migrations` applied.
#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user(pool: PgPool, email: &str) -> (PgStore, Uuid) {
        let store = PgStore { db: pool };
        let user = store.create(email, "$argon2id$placeholder").await.unwrap();
        (store, user.id)
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            description: "notes".into(),
            status: TaskStatus::Pending,
        }
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn duplicate_email_is_a_unique_violation(pool: PgPool) {
        let (store, _) = store_with_user(pool, "u@x.com").await;
        let err = store.create("u@x.com", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn queries_are_scoped_to_the_owner(pool: PgPool) {
        let (store, alice) = store_with_user(pool, "alice@x.com").await;
        let bob = store.create("bob@x.com", "h").await.unwrap().id;
        let task = store.insert(bob, &new_task("bob's")).await.unwrap();

        assert!(store.find_owned(alice, task.id).await.unwrap().is_none());
        assert!(store.list_by_owner(alice).await.unwrap().is_empty());
        let changes = TaskChanges {
            title: Some("hijacked".into()),
            ..Default::default()
        };
        assert!(store.update_owned(alice, task.id, &changes).await.unwrap().is_none());
        assert!(!store.delete_owned(alice, task.id).await.unwrap());

        let still = store.find_owned(bob, task.id).await.unwrap().unwrap();
        assert_eq!(still.title, "bob's");
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn partial_update_keeps_unset_columns(pool: PgPool) {
        let (store, owner) = store_with_user(pool, "u@x.com").await;
        let task = store.insert(owner, &new_task("write report")).await.unwrap();

        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let updated = store
            .update_owned(owner, task.id, &changes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "write report");
        assert_eq!(updated.description, "notes");
        assert!(updated.updated_at >= task.updated_at);
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn counts_split_by_status(pool: PgPool) {
        let (store, owner) = store_with_user(pool, "u@x.com").await;
        for i in 0..3 {
            let task = store.insert(owner, &new_task(&format!("t{i}"))).await.unwrap();
            if i == 0 {
                let done = TaskChanges {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                };
                store.update_owned(owner, task.id, &done).await.unwrap();
            }
        }

        assert_eq!(store.count(owner, None).await.unwrap(), 3);
        assert_eq!(store.count(owner, Some(TaskStatus::Completed)).await.unwrap(), 1);
        assert_eq!(store.count(owner, Some(TaskStatus::Pending)).await.unwrap(), 2);
        assert_eq!(store.count(Uuid::new_v4(), None).await.unwrap(), 0);
    }
}
