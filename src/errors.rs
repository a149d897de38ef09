use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::category::CategoryError;

/// Errors surfaced as HTTP statuses.
///
/// Compiler failures are not in here: they are part of a successful
/// `/compile` response.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Every compile worker has stopped
    #[error("Compile queue is closed")]
    QueueClosed,

    /// A worker took the job but never answered
    #[error("Compile worker dropped the job")]
    WorkerDropped,

    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error("Failed to query compiler version: {message}")]
    Version { message: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            Error::WorkerDropped | Error::Version { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Category(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Category(_) => tracing::debug!("Client error: {}", self),
            _ => tracing::error!("Internal service error: {}", self),
        }

        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_errors_are_client_errors() {
        let err = Error::from(CategoryError::MissingRoot);

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Could not find root node for the anime titles.");
    }

    #[test]
    fn closed_queue_is_unavailable() {
        assert_eq!(Error::QueueClosed.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(Error::WorkerDropped.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
