//! Handler for `GET /catalog`.

use axum::{Json, extract::State};
use shelf_core::{
  catalog::CatalogClient,
  error::from_backend,
  identity::require,
  library::{CatalogListing, annotate},
};
use tracing::debug;

use crate::{AppState, Backend, auth::Viewer, error::ApiError};

/// `GET /catalog` — every catalog book, flagged with whether the caller has
/// it in their library.
pub async fn list<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
) -> Result<Json<Vec<CatalogListing>>, ApiError> {
  let session = require(viewer.session())?;

  let books = state.catalog.list_books().await.map_err(from_backend)?;
  let members = state.library.membership(&session.user_id).await?;
  debug!(books = books.len(), saved = members.len(), "annotating catalog");

  Ok(Json(annotate(books, &members)))
}
