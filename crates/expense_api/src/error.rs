//! API error type and its HTTP rendering.
//!
//! Not-found maps to an empty 404. Every other failure is logged and
//! rendered as an empty 500 with no machine-readable detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use expense_core::{ExpenseId, RepoError};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    /// No expense with this id.
    NotFound(ExpenseId),
    /// A required field was absent from the request body.
    MissingField(&'static str),
    /// Storage failure other than not-found.
    Storage(RepoError),
    /// The blocking worker running the storage call failed.
    Worker(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "expense not found: {id}"),
            Self::MissingField(field) => write!(f, "required field `{field}` is missing"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Worker(message) => write!(f, "storage worker failed: {message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
            other => {
                error!("event=api_error module=api status=error error={other}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use expense_core::RepoError;

    #[tokio::test]
    async fn not_found_is_empty_404() {
        let response = ApiError::from(RepoError::NotFound(9)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn other_failures_are_empty_500() {
        let errors = [
            ApiError::MissingField("description"),
            ApiError::from(RepoError::InvalidData("bad row".to_string())),
            ApiError::Worker("cancelled".to_string()),
        ];
        for err in errors {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(body.is_empty());
        }
    }
}
