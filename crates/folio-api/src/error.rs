//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use folio_core::Error;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or empty X-Author-Id header")]
  Unauthenticated,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) => match e {
        Error::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        Error::DocumentNotFound(_) | Error::VersionNotFound { .. } => {
          StatusCode::NOT_FOUND
        }
        Error::NoOpTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::EmptyChangeSummary | Error::UnknownMode(_) => {
          StatusCode::BAD_REQUEST
        }
        Error::MissingAuthor => StatusCode::UNAUTHORIZED,
        Error::ConcurrentModificationConflict(_) => StatusCode::CONFLICT,
        Error::ContentBackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::ContentMissing(_) | Error::Store(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn domain_errors_map_to_statuses() {
    let id = Uuid::nil();
    let cases = [
      (Error::DocumentNotFound(id), StatusCode::NOT_FOUND),
      (
        Error::VersionNotFound { document_id: id, version_number: 3 },
        StatusCode::NOT_FOUND,
      ),
      (
        Error::NoOpTransition(folio_core::mode::Mode::Beta),
        StatusCode::UNPROCESSABLE_ENTITY,
      ),
      (Error::ConcurrentModificationConflict(id), StatusCode::CONFLICT),
      (Error::EmptyChangeSummary, StatusCode::BAD_REQUEST),
      (Error::UnknownMode("draft".into()), StatusCode::BAD_REQUEST),
      (
        Error::content(std::io::Error::other("down")),
        StatusCode::SERVICE_UNAVAILABLE,
      ),
      (
        Error::store(std::io::Error::other("disk")),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (error, status) in cases {
      assert_eq!(ApiError::from(error).status(), status);
    }
  }
}
