use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, UpdateTaskRequest},
    repo_types::{NewTask, Task, TaskChanges, TaskStatus, TaskSummary},
};
use crate::{
    error::{AppError, AppResult},
    store::TaskStore,
};

/// `None` and `""` both mean "not supplied".
fn parse_status(raw: Option<&str>) -> AppResult<Option<TaskStatus>> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<TaskStatus>()
            .map(Some)
            .map_err(|e| AppError::Validation(e.to_string())),
    }
}

pub(crate) fn new_task(req: CreateTaskRequest) -> AppResult<NewTask> {
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("title is required".into()))?;
    Ok(NewTask {
        title,
        description: req.description.unwrap_or_default(),
        status: parse_status(req.status.as_deref())?.unwrap_or_default(),
    })
}

/// `""` leaves a field as it is; a title made only of whitespace is rejected.
pub(crate) fn task_changes(req: UpdateTaskRequest) -> AppResult<TaskChanges> {
    let title = match req.title {
        Some(t) if t.is_empty() => None,
        Some(t) if t.trim().is_empty() => {
            return Err(AppError::Validation("title cannot be blank".into()))
        }
        other => other,
    };
    Ok(TaskChanges {
        status: parse_status(req.status.as_deref())?,
        title,
        description: req.description.filter(|d| !d.is_empty()),
    })
}

pub async fn list(tasks: &dyn TaskStore, owner: Uuid) -> AppResult<Vec<Task>> {
    Ok(tasks.list_by_owner(owner).await?)
}

pub async fn get(tasks: &dyn TaskStore, owner: Uuid, id: Uuid) -> AppResult<Task> {
    tasks.find_owned(owner, id).await?.ok_or(AppError::NotFound)
}

pub async fn create(tasks: &dyn TaskStore, owner: Uuid, req: CreateTaskRequest) -> AppResult<Task> {
    let new = new_task(req)?;
    let task = tasks.insert(owner, &new).await?;
    info!(task_id = %task.id, user_id = %owner, status = %task.status, "task created");
    Ok(task)
}

pub async fn update(
    tasks: &dyn TaskStore,
    owner: Uuid,
    id: Uuid,
    req: UpdateTaskRequest,
) -> AppResult<Task> {
    let changes = task_changes(req)?;
    if changes.is_empty() {
        debug!(task_id = %id, "update carries no changes");
        return get(tasks, owner, id).await;
    }
    let task = tasks
        .update_owned(owner, id, &changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(task_id = %task.id, user_id = %owner, "task updated");
    Ok(task)
}

pub async fn delete(tasks: &dyn TaskStore, owner: Uuid, id: Uuid) -> AppResult<()> {
    if !tasks.delete_owned(owner, id).await? {
        return Err(AppError::NotFound);
    }
    info!(task_id = %id, user_id = %owner, "task deleted");
    Ok(())
}

/// Runs the three counts concurrently and fails with whichever error is seen
/// first. Each count is its own snapshot, so `total` may differ from
/// `completed + pending` while another request is mutating the same tasks.
pub async fn summarize(tasks: &dyn TaskStore, owner: Uuid) -> AppResult<TaskSummary> {
    let (total_tasks, completed_tasks, pending_tasks) = tokio::try_join!(
        tasks.count(owner, None),
        tasks.count(owner, Some(TaskStatus::Completed)),
        tasks.count(owner, Some(TaskStatus::Pending)),
    )?;
    Ok(TaskSummary {
        total_tasks,
        completed_tasks,
        pending_tasks,
    })
}
