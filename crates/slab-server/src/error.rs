use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use slab_shared::{Notice, SchemaError, ValidationError};
use slab_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many attempts, try again shortly")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(v) => ServerError::Validation(v),
            StoreError::Schema(s) => ServerError::Schema(s),
            StoreError::NotFound => ServerError::NotFound("record not found".into()),
            StoreError::UnknownCollection(key) => {
                ServerError::NotFound(format!("unknown collection {key}"))
            }
            e @ (StoreError::NoSuchList { .. } | StoreError::NoImage { .. }) => {
                ServerError::BadRequest(e.to_string())
            }
            e @ (StoreError::NotEditing(_) | StoreError::Taken(_)) => {
                ServerError::Conflict(e.to_string())
            }
            StoreError::InvalidCredentials => {
                ServerError::Unauthorized("invalid login or password".into())
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::Schema(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn notice_title(&self) -> &'static str {
        match self {
            ServerError::Validation(ValidationError::MissingFields(_)) => {
                "Missing required fields"
            }
            ServerError::Validation(_) | ServerError::Schema(_) | ServerError::BadRequest(_) => {
                "Invalid input"
            }
            ServerError::Unauthorized(_) | ServerError::Forbidden(_) => "Access denied",
            ServerError::NotFound(_) => "Not found",
            ServerError::Conflict(_) => "Could not complete",
            ServerError::RateLimited => "Slow down",
            ServerError::Internal(_) => "Something went wrong",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        let notice = Notice::error(self.notice_title(), message.clone());

        let body = serde_json::json!({
            "error": message,
            "notice": notice,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slab_shared::EntityKind;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (
                StoreError::Validation(ValidationError::MissingFields(vec!["name".into()])),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (StoreError::NotEditing(EntityKind::Character), StatusCode::CONFLICT),
            (StoreError::Taken("email"), StatusCode::CONFLICT),
            (StoreError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (StoreError::Corrupt("bad row".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ServerError::from(err).status(), expected);
        }
    }

    #[test]
    fn internal_details_are_not_returned() {
        let response = ServerError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
