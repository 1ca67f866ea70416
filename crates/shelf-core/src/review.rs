//! Reviews: validated field types, the lifecycle state machine, and the
//! manager that persists create/update/delete.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
  Error, Result, ValidationError, aggregate,
  error::from_backend,
  id::{BookId, ReviewId, UserId},
  identity::{Session, require},
  store::{ReviewQuery, ShelfStore},
};

// ─── Field types ─────────────────────────────────────────────────────────────

/// A star rating in `1..=5`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MAX: u8 = 5;

  /// `0` means "no stars picked" and is reported as [`ValidationError::NoRating`].
  pub fn new(value: u8) -> Result<Self, ValidationError> {
    match value {
      0 => Err(ValidationError::NoRating),
      1..=5 => Ok(Self(value)),
      other => Err(ValidationError::RatingOutOfRange(other)),
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Rating {
  type Error = ValidationError;

  fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

/// Review text, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Comment(String);

impl Comment {
  pub fn parse(raw: &str) -> Result<Self, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(ValidationError::EmptyComment);
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for Comment {
  type Error = ValidationError;

  fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<Comment> for String {
  fn from(c: Comment) -> Self { c.0 }
}

impl fmt::Display for Comment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Where a single review is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
  Absent,
  Draft,
  Persisted,
  Edited,
  Deleted,
}

/// Something the author does to a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewEvent {
  Compose,
  Submit,
  Edit,
  Delete,
}

impl ReviewState {
  /// Apply `event`, or fail with [`Error::InvalidTransition`].
  ///
  /// ```text
  /// Absent --compose--> Draft --submit--> Persisted
  /// Persisted | Edited --edit--> Edited
  /// Persisted | Edited --delete--> Deleted   (terminal)
  /// ```
  pub fn advance(self, event: ReviewEvent) -> Result<Self> {
    use ReviewEvent as E;
    use ReviewState as S;
    match (self, event) {
      (S::Absent, E::Compose) => Ok(S::Draft),
      (S::Draft, E::Submit) => Ok(S::Persisted),
      (S::Persisted | S::Edited, E::Edit) => Ok(S::Edited),
      (S::Persisted | S::Edited, E::Delete) => Ok(S::Deleted),
      (from, event) => Err(Error::InvalidTransition { from, event }),
    }
  }

  pub fn is_terminal(self) -> bool { self == Self::Deleted }
}

impl fmt::Display for ReviewState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Absent => "absent",
      Self::Draft => "draft",
      Self::Persisted => "persisted",
      Self::Edited => "edited",
      Self::Deleted => "deleted",
    })
  }
}

impl fmt::Display for ReviewEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Compose => "compose",
      Self::Submit => "submit",
      Self::Edit => "edit",
      Self::Delete => "delete",
    })
  }
}

// ─── Review ──────────────────────────────────────────────────────────────────

/// A stored review. `book_id`, `user_id` and `created_at` never change.
///
/// Deleting a review leaves a tombstone (`deleted_at` set) that only
/// [`ShelfStore::get_review`] returns; listings skip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub review_id:  ReviewId,
  pub book_id:    BookId,
  pub book_title: String,
  /// The author.
  pub user_id:    UserId,
  pub comment:    Comment,
  pub rating:     Rating,
  pub created_at: DateTime<Utc>,
  /// Time of the last edit, if any.
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Review {
  pub fn state(&self) -> ReviewState {
    match (self.deleted_at, self.updated_at) {
      (Some(_), _) => ReviewState::Deleted,
      (None, Some(_)) => ReviewState::Edited,
      (None, None) => ReviewState::Persisted,
    }
  }
}

/// Input to [`ShelfStore::insert_review`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
  pub book_id:    BookId,
  pub book_title: String,
  pub user_id:    UserId,
  pub comment:    Comment,
  pub rating:     Rating,
}

/// The two fields an author may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPatch {
  pub comment: Comment,
  pub rating:  Rating,
}

impl ReviewPatch {
  /// Validate raw form input; the comment is checked before the rating.
  pub fn new(comment: &str, rating: u8) -> Result<Self, ValidationError> {
    Ok(Self { comment: Comment::parse(comment)?, rating: Rating::new(rating)? })
  }
}

/// Unvalidated review form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
  pub book_id:    BookId,
  pub book_title: String,
  pub comment:    String,
  /// `0` while no stars are selected.
  #[serde(default)]
  pub rating:     u8,
}

impl ReviewDraft {
  /// Check the draft and attribute it to `author`.
  pub fn validate(self, author: UserId) -> Result<NewReview, ValidationError> {
    let ReviewPatch { comment, rating } = ReviewPatch::new(&self.comment, self.rating)?;
    Ok(NewReview {
      book_id: self.book_id,
      book_title: self.book_title,
      user_id: author,
      comment,
      rating,
    })
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Persists review writes after validating them client-side.
///
/// Store failures come back as [`Error::StoreUnavailable`]; nothing is retried
/// here. Re-submitting is up to the user.
pub struct ReviewManager<S> {
  store: Arc<S>,
}

impl<S> Clone for ReviewManager<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: ShelfStore> ReviewManager<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Create a review authored by the session's user.
  pub async fn submit(&self, session: Option<&Session>, draft: ReviewDraft) -> Result<Review> {
    let session = require(session)?;
    let state = ReviewState::Absent.advance(ReviewEvent::Compose)?;
    let input = draft.validate(session.user_id.clone())?;
    state.advance(ReviewEvent::Submit)?;

    let review = self.store.insert_review(input).await.map_err(from_backend)?;
    info!(
      review_id = %review.review_id,
      book_id = %review.book_id,
      user_id = %review.user_id,
      rating = review.rating.get(),
      "review submitted"
    );
    Ok(review)
  }

  /// Replace comment and rating. The store rejects requesters other than the
  /// author with [`Error::Forbidden`]; a deleted review cannot be edited.
  pub async fn update(
    &self,
    session: Option<&Session>,
    review_id: &ReviewId,
    comment: &str,
    rating: u8,
  ) -> Result<Review> {
    let session = require(session)?;
    let patch = ReviewPatch::new(comment, rating)?;

    let Some(current) = self.load(review_id).await? else {
      return Err(Error::NotFound(format!("review {review_id}")));
    };
    if !aggregate::is_owner(&current, &session.user_id) {
      return Err(Error::Forbidden);
    }
    current.state().advance(ReviewEvent::Edit)?;

    let review = self
      .store
      .update_review(session.user_id.clone(), review_id.clone(), patch)
      .await
      .map_err(from_backend)?;
    info!(%review_id, rating = review.rating.get(), "review updated");
    Ok(review)
  }

  /// Delete one of the caller's reviews. Deleting an id that does not exist
  /// or is already deleted returns `false`.
  pub async fn delete(&self, session: Option<&Session>, review_id: &ReviewId) -> Result<bool> {
    let session = require(session)?;

    match self.load(review_id).await? {
      Some(current) if !aggregate::is_owner(&current, &session.user_id) => {
        return Err(Error::Forbidden);
      }
      Some(current) if !current.state().is_terminal() => {
        current.state().advance(ReviewEvent::Delete)?;
      }
      _ => {
        debug!(%review_id, "review already absent");
        return Ok(false);
      }
    }

    let deleted = self
      .store
      .delete_review(session.user_id.clone(), review_id.clone())
      .await
      .map_err(from_backend)?;

    if deleted {
      info!(%review_id, "review deleted");
    } else {
      debug!(%review_id, "review already absent");
    }
    Ok(deleted)
  }

  async fn load(&self, review_id: &ReviewId) -> Result<Option<Review>> {
    self.store.get_review(review_id.clone()).await.map_err(from_backend)
  }

  /// Reviews of one book, newest first.
  pub async fn for_book(&self, book_id: &BookId) -> Result<Vec<Review>> {
    self
      .store
      .find_reviews(ReviewQuery::for_book(book_id.clone()))
      .await
      .map_err(Into::into)
  }

  /// Reviews written by `user_id`, highest rating first.
  pub async fn for_user(&self, user_id: &UserId) -> Result<Vec<Review>> {
    let reviews = self
      .store
      .find_reviews(ReviewQuery::by_author(user_id.clone()))
      .await
      .map_err(from_backend)?;
    Ok(aggregate::by_rating_desc(reviews))
  }
}
