//! Error types and axum `IntoResponse` implementation for the scraping
//! endpoints.
//!
//! Every error body has the shape `{"success": false, "error": "..."}` so the
//! dashboard can show the message as-is.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request is well-formed but asks for something we won't do.
  #[error("{0}")]
  Validation(String),
  #[error("scraping job {0} not found")]
  JobNotFound(String),
  #[error("no scraping job has been started")]
  NoJobs,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Validation(_) => StatusCode::BAD_REQUEST,
      Error::JobNotFound(_) | Error::NoJobs => StatusCode::NOT_FOUND,
    };
    let body = json!({ "success": false, "error": self.to_string() });
    (status, Json(body)).into_response()
  }
}
