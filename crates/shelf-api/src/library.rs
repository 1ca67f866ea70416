//! Handlers for `/library` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use shelf_core::{
  book::CatalogBook,
  catalog::CatalogClient,
  id::EntryId,
  library::LibraryEntry,
};

use crate::{
  AppState, Backend,
  auth::Viewer,
  error::{ApiError, JsonBody},
};

/// `GET /library`
pub async fn list<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
) -> Result<Json<Vec<LibraryEntry>>, ApiError> {
  Ok(Json(state.library.list(viewer.session()).await?))
}

/// `POST /library` — body: the catalog book to save.
pub async fn add<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
  JsonBody(book): JsonBody<CatalogBook>,
) -> Result<impl IntoResponse, ApiError> {
  let entry = state.library.add(viewer.session(), &book).await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

/// `DELETE /library/{entry_id}` — 204 whether or not the entry existed.
pub async fn remove<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
  Path(entry_id): Path<EntryId>,
) -> Result<StatusCode, ApiError> {
  state.library.remove(viewer.session(), &entry_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
