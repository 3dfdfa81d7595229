use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Internal(err) => {
                tracing::error!("API internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message, "message": message }))).into_response()
    }
}

impl From<muster_core::error::CoreError> for ApiError {
    fn from(e: muster_core::error::CoreError) -> Self {
        match e {
            muster_core::error::CoreError::NotFound => ApiError::NotFound,
            muster_core::error::CoreError::BadRequest(msg) => ApiError::BadRequest(msg),
            muster_core::error::CoreError::Database(err) => err.into(),
        }
    }
}

impl From<muster_db::DbError> for ApiError {
    fn from(e: muster_db::DbError) -> Self {
        match e {
            muster_db::DbError::Sqlx(err) => {
                ApiError::Internal(anyhow::anyhow!("database error: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muster_core::error::CoreError;

    #[test]
    fn missing_entries_are_404_and_storage_failures_500() {
        let not_found = ApiError::from(CoreError::NotFound).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let db = muster_db::DbError::Sqlx(sqlx::Error::RowNotFound);
        let internal = ApiError::from(CoreError::Database(db)).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
