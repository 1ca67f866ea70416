//! Handlers for `/auth/*` and `/profile`.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use shelf_core::{
  account::{self, ProfileSummary, RegistrationForm},
  catalog::CatalogClient,
  error::from_backend,
  id::{SessionToken, UserId},
  identity::{IdentityProvider, Session, require},
};

use crate::{
  AppState, Backend,
  auth::Viewer,
  error::{ApiError, JsonBody},
};

/// What a client keeps after signing in.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionBody {
  pub token:   SessionToken,
  pub user_id: UserId,
  pub email:   String,
}

impl From<Session> for SessionBody {
  fn from(s: Session) -> Self { Self { token: s.token, user_id: s.user_id, email: s.email } }
}

// ─── Register ────────────────────────────────────────────────────────────────

/// `POST /auth/register`
pub async fn register<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  JsonBody(form): JsonBody<RegistrationForm>,
) -> Result<impl IntoResponse, ApiError> {
  let session = account::register(&*state.store, &*state.store, form).await?;
  Ok((StatusCode::CREATED, Json(SessionBody::from(session))))
}

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<SessionBody>, ApiError> {
  let session = account::sign_in(&*state.store, &body.email, &body.password).await?;
  Ok(Json(session.into()))
}

/// `POST /auth/logout`
pub async fn logout<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
) -> Result<StatusCode, ApiError> {
  let session = require(viewer.session())?;
  state
    .store
    .sign_out(session.token.clone())
    .await
    .map_err(from_backend)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /profile`
pub async fn profile<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
) -> Result<Json<ProfileSummary>, ApiError> {
  let summary = account::profile_summary(&*state.store, viewer.session()).await?;
  Ok(Json(summary))
}
