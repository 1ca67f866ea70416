//! Handlers for review endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/books/{book_id}/reviews` | summary plus reviews, newest first |
//! | `POST`   | `/reviews` | body: `{"book_id","book_title","comment","rating"}` |
//! | `PUT`    | `/reviews/{review_id}` | body: `{"comment","rating"}`; author only |
//! | `DELETE` | `/reviews/{review_id}` | author only; 204 if already gone |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use shelf_core::{
  aggregate::{self, RatingSummary},
  catalog::CatalogClient,
  id::{BookId, ReviewId},
  identity::require,
  review::{Review, ReviewDraft, ReviewState},
};

use crate::{
  AppState, Backend,
  auth::Viewer,
  error::{ApiError, JsonBody},
};

// ─── Book reviews ────────────────────────────────────────────────────────────

/// One review as the book page shows it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewItem {
  pub review:   Review,
  pub state:    ReviewState,
  /// Whether the viewer wrote it and may edit or delete it.
  pub can_edit: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookReviews {
  pub summary: RatingSummary,
  pub reviews: Vec<ReviewItem>,
}

/// `GET /books/{book_id}/reviews`
pub async fn for_book<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
  Path(book_id): Path<BookId>,
) -> Result<Json<BookReviews>, ApiError> {
  let session = require(viewer.session())?;
  let reviews = state.reviews.for_book(&book_id).await?;

  let summary = aggregate::summarize(&reviews);
  let reviews = reviews
    .into_iter()
    .map(|review| ReviewItem {
      state: review.state(),
      can_edit: aggregate::is_owner(&review, &session.user_id),
      review,
    })
    .collect();

  Ok(Json(BookReviews { summary, reviews }))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /reviews`
pub async fn submit<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
  JsonBody(draft): JsonBody<ReviewDraft>,
) -> Result<impl IntoResponse, ApiError> {
  let review = state.reviews.submit(viewer.session(), draft).await?;
  Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub comment: String,
  #[serde(default)]
  pub rating:  u8,
}

/// `PUT /reviews/{review_id}`
pub async fn update<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
  Path(review_id): Path<ReviewId>,
  JsonBody(body): JsonBody<UpdateBody>,
) -> Result<Json<Review>, ApiError> {
  let review = state
    .reviews
    .update(viewer.session(), &review_id, &body.comment, body.rating)
    .await?;
  Ok(Json(review))
}

/// `DELETE /reviews/{review_id}`
pub async fn remove<S: Backend, C: CatalogClient + 'static>(
  State(state): State<AppState<S, C>>,
  viewer: Viewer,
  Path(review_id): Path<ReviewId>,
) -> Result<StatusCode, ApiError> {
  state.reviews.delete(viewer.session(), &review_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
