use serde::{Deserialize, Serialize};

/// Body of `POST /tasks`. `title` is optional here only so that a missing
/// title gets the same validation message as a blank one.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Body of `PUT /tasks/{id}`.
///
/// An absent field and an empty string both mean "leave unchanged"; there is
/// no way to clear `description` through this endpoint. A whitespace-only
/// title is a validation error.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
