//! The `IdentityProvider` trait and the [`Session`] it issues.
//!
//! Core operations never look up "the current user" on their own; callers
//! pass `Option<&Session>` and [`require`] turns `None` into
//! [`Error::Unauthenticated`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::{
  Error, Result,
  id::{SessionToken, UserId},
};

/// Failures reported by the identity provider itself.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum AuthError {
  #[error("email is already registered")]
  EmailAlreadyInUse,

  #[error("email is invalid")]
  InvalidEmail,

  #[error("password is too weak")]
  WeakPassword,

  #[error("wrong email or password")]
  InvalidCredentials,
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id: UserId,
  pub email:   String,
  pub token:   SessionToken,
}

/// Borrow the session out of `session` or fail with `Unauthenticated`.
pub fn require(session: Option<&Session>) -> Result<&Session> {
  session.ok_or(Error::Unauthenticated)
}

/// Abstraction over the service that verifies credentials and issues
/// sessions.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Into<Error> + Send + Sync + 'static;

  /// Create an account and sign it in.
  fn sign_up(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  fn sign_in(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// End the session named by `token`. Unknown tokens are ignored.
  fn sign_out(
    &self,
    token: SessionToken,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token to its live session, if any.
  fn current_session(
    &self,
    token: SessionToken,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;
}
