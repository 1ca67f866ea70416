//! Bearer-token extractor.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use shelf_core::{
  catalog::CatalogClient,
  error::from_backend,
  id::SessionToken,
  identity::{IdentityProvider, Session},
};

use crate::{AppState, Backend, error::ApiError};

/// The session named by the request's bearer token, if it resolves to one.
///
/// A missing, malformed or expired token yields `Viewer(None)`; operations
/// that need a user then fail with `Unauthenticated` (401).
pub struct Viewer(pub Option<Session>);

impl Viewer {
  pub fn session(&self) -> Option<&Session> { self.0.as_ref() }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ")?.trim();
  (!token.is_empty()).then(|| SessionToken::from(token))
}

impl<S, C> FromRequestParts<AppState<S, C>> for Viewer
where
  S: Backend,
  C: CatalogClient + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    let Some(token) = bearer_token(&parts.headers) else {
      return Ok(Viewer(None));
    };
    let session = state
      .store
      .current_session(token)
      .await
      .map_err(from_backend)?;
    Ok(Viewer(session))
  }
}
