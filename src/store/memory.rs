use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::{
    auth::repo_types::User,
    tasks::repo_types::{NewTask, Task, TaskChanges, TaskStatus},
};

/// In-process store used by unit and router tests.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
    tasks: Mutex<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap();
        // newest first, matching the Postgres ordering
        Ok(tasks.iter().rev().filter(|t| t.user_id == owner).cloned().collect())
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .iter()
            .find(|t| t.id == id && t.user_id == owner)
            .cloned())
    }

    async fn insert(&self, owner: Uuid, task: &NewTask) -> StoreResult<Task> {
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: Uuid::new_v4(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            user_id: owner,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: &TaskChanges,
    ) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && t.user_id == owner) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            task.title = title.clone();
        }
        if let Some(description) = &changes.description {
            task.description = description.clone();
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == owner));
        Ok(tasks.len() != before)
    }

    async fn count(&self, owner: Uuid, status: Option<TaskStatus>) -> StoreResult<i64> {
        let tasks = self.tasks.lock().unwrap();
        let n = tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .filter(|t| status.map_or(true, |s| t.status == s))
            .count();
        Ok(n as i64)
    }
}
