use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sqlx::error::ErrorKind;

pub type ApiResponse<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("database error: {0}")]
    Internal(#[source] sqlx::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: &'static str,
}

impl ApiError {
    /// Classifies a failure of an insert/delete. Constraint violations and
    /// connectivity problems are reported to the client as unprocessable,
    /// anything else stays an internal error.
    pub fn from_write(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_error)
                if matches!(
                    db_error.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                ) =>
            {
                ApiError::Unprocessable(db_error.message().to_owned())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => ApiError::Unprocessable(error.to_string()),
            _ => ApiError::from(error),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad request",
            ApiError::NotFound(_) => "resource not found",
            ApiError::Unprocessable(_) => "unprocessible",
            ApiError::MethodNotAllowed => "method not allowed",
            ApiError::Internal(_) => "internal server error",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => ApiError::NotFound("row not found".to_owned()),
            error => ApiError::Internal(error),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// Mirrors a route that only matches integer segments
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::NotFound(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(error) => tracing::error!("Request failed: {error:?}"),
            other => tracing::debug!("Request rejected: {other}"),
        }
        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{testing, NewQuestion};

    #[tokio::test]
    async fn constraint_violations_are_unprocessable() {
        let pool = testing::pool().await;
        testing::seed_categories(&pool).await;
        let question = NewQuestion {
            question: "Too hard?".to_owned(),
            answer: "Yes".to_owned(),
            category: 1,
            difficulty: 9,
        };

        let error = crate::db::queries::questions::create_question(&pool, &question)
            .await
            .unwrap_err();
        let error = ApiError::from_write(error);
        assert!(matches!(error, ApiError::Unprocessable(_)));
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn other_storage_errors_stay_internal() {
        let error = ApiError::from_write(sqlx::Error::Protocol("bad frame".to_owned()));
        assert!(matches!(error, ApiError::Internal(_)));
        assert!(matches!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn error_body_echoes_status() {
        let response = ApiError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": 405,
                "message": "method not allowed"
            })
        );
    }
}
