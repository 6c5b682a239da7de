use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateTaskRequest, MessageResponse, UpdateTaskRequest},
    repo_types::{Task, TaskSummary},
    services,
};
use crate::{
    auth::jwt::AuthUser,
    error::AppResult,
    extract::{parse_id, ValidJson},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/summary", get(tasks_summary))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[instrument(skip(state, me), fields(user_id = %me.user_id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> AppResult<Json<Vec<Task>>> {
    let tasks = services::list(state.tasks.as_ref(), me.user_id).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, me, body), fields(user_id = %me.user_id, email = %me.email))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    ValidJson(body): ValidJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let task = services::create(state.tasks.as_ref(), me.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, me), fields(user_id = %me.user_id))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let id = parse_id(&id)?;
    let task = services::get(state.tasks.as_ref(), me.user_id, id).await?;
    Ok(Json(task))
}

#[instrument(skip(state, me, body), fields(user_id = %me.user_id))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateTaskRequest>,
) -> AppResult<Json<Task>> {
    let id = parse_id(&id)?;
    let task = services::update(state.tasks.as_ref(), me.user_id, id, body).await?;
    Ok(Json(task))
}

#[instrument(skip(state, me), fields(user_id = %me.user_id))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    services::delete(state.tasks.as_ref(), me.user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "task deleted".into(),
    }))
}

#[instrument(skip(state, me), fields(user_id = %me.user_id))]
pub async fn tasks_summary(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> AppResult<Json<TaskSummary>> {
    let summary = services::summarize(state.tasks.as_ref(), me.user_id).await?;
    Ok(Json(summary))
}
