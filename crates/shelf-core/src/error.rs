//! Error types for `shelf-core`.

use thiserror::Error;

use crate::{
  id::BookId,
  identity::AuthError,
  review::{ReviewEvent, ReviewState},
};

/// A rejected form field. Always raised before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("comment must not be empty")]
  EmptyComment,

  #[error("a star rating is required")]
  NoRating,

  #[error("rating {0} is outside 1..=5")]
  RatingOutOfRange(u8),

  #[error("first and last name are required")]
  MissingName,

  #[error("email is required")]
  MissingEmail,

  #[error("email address is malformed")]
  MalformedEmail,

  #[error("password is required")]
  MissingPassword,

  #[error(
    "password needs 8 characters with a lowercase letter, an uppercase \
     letter, a digit and one of !@#$%^&*"
  )]
  WeakPassword,

  #[error("passwords do not match")]
  PasswordMismatch,
}

#[derive(Debug, Error)]
pub enum Error {
  /// The action needs a signed-in user and none was supplied.
  #[error("sign in required")]
  Unauthenticated,

  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("book {0} is already in the library")]
  AlreadyMember(BookId),

  #[error("not found: {0}")]
  NotFound(String),

  /// The requester is not the owner of the document it tried to change.
  #[error("only the author may change this review")]
  Forbidden,

  #[error("cannot {event} a review that is {from}")]
  InvalidTransition {
    from:  ReviewState,
    event: ReviewEvent,
  },

  #[error("authentication failed: {0}")]
  Auth(#[from] AuthError),

  /// The backend could not be reached or failed mid-request. Retrying the
  /// same action later may succeed.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend failure as [`Error::StoreUnavailable`].
  pub fn unavailable(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::StoreUnavailable(Box::new(e))
  }

  /// Whether re-submitting the same action could succeed.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::StoreUnavailable(_))
  }
}

/// Convert a backend error into [`Error`]. Use with `map_err` ahead of `?`,
/// where `Into::into` alone leaves the target type ambiguous.
pub fn from_backend<E: Into<Error>>(e: E) -> Error { e.into() }

pub type Result<T, E = Error> = std::result::Result<T, E>;
