use axum::extract::{rejection::JsonRejection, FromRequest};
use uuid::Uuid;

use crate::error::AppError;

/// `axum::Json` whose rejections become 400 `validation_error` responses
/// instead of axum's plain-text 400/415/422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("invalid request body: {}", rejection.body_text()))
    }
}

/// Task ids arrive as path segments; anything but a UUID is a client error.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("invalid task id {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid_only() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("42"), Err(AppError::Validation(_))));
        assert!(matches!(parse_id("not-a-uuid"), Err(AppError::Validation(_))));
    }
}
