//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": "<message>", "retryable": <bool>}`,
//! including rejected request bodies (see [`JsonBody`]).

use axum::{
  Json,
  extract::{FromRequest, rejection::JsonRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use shelf_core::{Error as CoreError, identity::AuthError};
use thiserror::Error;
use tracing::{error, warn};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  /// The request body was not the JSON the endpoint expects.
  #[error("bad request: {}", .0.body_text())]
  BadRequest(#[from] JsonRejection),
}

/// [`axum::Json`] whose rejection is rendered as an [`ApiError`], so a
/// malformed body still gets the JSON error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl ApiError {
  pub fn status(&self) -> StatusCode {
    let e = match self {
      ApiError::Core(e) => e,
      ApiError::BadRequest(rejection) => return rejection.status(),
    };
    match e {
      CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
      CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      CoreError::AlreadyMember(_) => StatusCode::CONFLICT,
      CoreError::NotFound(_) => StatusCode::NOT_FOUND,
      CoreError::Forbidden => StatusCode::FORBIDDEN,
      CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
      CoreError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
      CoreError::Auth(AuthError::EmailAlreadyInUse) => StatusCode::CONFLICT,
      CoreError::Auth(AuthError::InvalidEmail | AuthError::WeakPassword) => {
        StatusCode::UNPROCESSABLE_ENTITY
      }
      CoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      CoreError::Serialization(_) => StatusCode::BAD_GATEWAY,
    }
  }

  pub fn is_retryable(&self) -> bool {
    match self {
      ApiError::Core(e) => e.is_retryable(),
      ApiError::BadRequest(_) => false,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "request failed");
    } else {
      warn!(%status, error = %self, "request rejected");
    }
    let body = json!({ "error": self.to_string(), "retryable": self.is_retryable() });
    (status, Json(body)).into_response()
  }
}
