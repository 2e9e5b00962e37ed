//! Error taxonomy shared by the AI pipeline, the store and the HTTP layer.
//!
//! Every failure is per-request. Handlers return `Result<_, TutorError>` and the
//! `IntoResponse` impl turns it into `{"error": "..."}` with a matching status.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
  /// Malformed or missing caller input.
  #[error("invalid request: {0}")]
  Validation(String),

  /// Completion service unreachable, non-2xx, or without choices.
  #[error("completion service error: {0}")]
  Upstream(String),

  /// No `{...}` span could be recovered from the model output.
  #[error("no JSON object found in model output: {raw:?}")]
  NoJsonFound { raw: String },

  /// JSON present but it does not match the expected response shape.
  #[error("model output does not match the expected shape: {0}")]
  Decode(String),

  #[error("storage error: {0}")]
  Persistence(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  /// Server-side fault outside the store, e.g. password hashing.
  #[error("internal error: {0}")]
  Internal(String),
}

impl TutorError {
  pub fn validation(message: impl Into<String>) -> Self {
    TutorError::Validation(message.into())
  }

  pub fn upstream(message: impl Into<String>) -> Self {
    TutorError::Upstream(message.into())
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    TutorError::NotFound(message.into())
  }

  pub fn unauthorized(message: impl Into<String>) -> Self {
    TutorError::Unauthorized(message.into())
  }

  /// Status code used when the error reaches the HTTP boundary.
  pub fn status(&self) -> StatusCode {
    match self {
      TutorError::Validation(_) => StatusCode::BAD_REQUEST,
      TutorError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      TutorError::NotFound(_) => StatusCode::NOT_FOUND,
      TutorError::Upstream(_) | TutorError::NoJsonFound { .. } | TutorError::Decode(_) => {
        StatusCode::BAD_GATEWAY
      }
      TutorError::Persistence(_) | TutorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Message shown to API clients. Model output and SQL details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      TutorError::Validation(msg) | TutorError::NotFound(msg) | TutorError::Unauthorized(msg) => {
        msg.clone()
      }
      TutorError::Upstream(_) => "Error contacting the AI service".into(),
      TutorError::NoJsonFound { .. } | TutorError::Decode(_) => {
        "Error parsing the AI response".into()
      }
      TutorError::Persistence(_) => "Error accessing the database".into(),
      TutorError::Internal(_) => "Internal server error".into(),
    }
  }
}

impl From<sqlx::Error> for TutorError {
  fn from(err: sqlx::Error) -> Self {
    match err {
      sqlx::Error::RowNotFound => TutorError::NotFound("record not found".into()),
      other => TutorError::Persistence(other.to_string()),
    }
  }
}

impl From<reqwest::Error> for TutorError {
  fn from(err: reqwest::Error) -> Self {
    TutorError::Upstream(err.to_string())
  }
}

impl From<bcrypt::BcryptError> for TutorError {
  fn from(err: bcrypt::BcryptError) -> Self {
    TutorError::Internal(format!("password hashing failed: {err}"))
  }
}

impl IntoResponse for TutorError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "coding_tutor", %status, error = %self, "Request failed");
    }
    (status, Json(json!({ "error": self.public_message() }))).into_response()
  }
}

pub type TutorResult<T> = Result<T, TutorError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn row_not_found_maps_to_not_found() {
    let err: TutorError = sqlx::Error::RowNotFound.into();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn model_failures_hide_raw_output_from_clients() {
    let err = TutorError::NoJsonFound { raw: "secret prose".into() };
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(err.public_message(), "Error parsing the AI response");
    assert!(err.to_string().contains("secret prose"));
  }

  #[test]
  fn hashing_failure_is_a_server_error() {
    // Cost 3 is below bcrypt's minimum.
    let err: TutorError = bcrypt::hash("pw", 3).unwrap_err().into();
    assert!(matches!(err, TutorError::Internal(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.public_message(), "Internal server error");
  }
}
