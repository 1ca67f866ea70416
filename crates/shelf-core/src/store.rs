//! The `ShelfStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `shelf-store-sqlite`).
//! It models three independently-addressed collections: `users`,
//! `userBooks` and `reviews`. Every write touches exactly one document; no
//! operation spans documents atomically.

use std::future::Future;

use crate::{
  Error,
  account::UserProfile,
  id::{BookId, EntryId, ReviewId, UserId},
  library::{LibraryEntry, NewLibraryEntry},
  review::{NewReview, Review, ReviewPatch},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Which reviews to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewFilter {
  Book(BookId),
  Author(UserId),
}

/// Order in which the store returns reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewOrder {
  /// Insertion order (oldest first).
  #[default]
  Stored,
  /// `created_at` descending.
  NewestFirst,
}

/// Parameters for [`ShelfStore::find_reviews`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQuery {
  pub filter: ReviewFilter,
  pub order:  ReviewOrder,
}

impl ReviewQuery {
  /// All reviews of one book, newest first.
  pub fn for_book(book_id: BookId) -> Self {
    Self { filter: ReviewFilter::Book(book_id), order: ReviewOrder::NewestFirst }
  }

  /// All reviews written by one user, in stored order.
  pub fn by_author(user_id: UserId) -> Self {
    Self { filter: ReviewFilter::Author(user_id), order: ReviewOrder::Stored }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the document store backend.
///
/// Backends convert their errors into [`Error`]; a uniqueness violation on
/// `(user_id, book_id)` must become [`Error::AlreadyMember`], an ownership
/// mismatch on review writes [`Error::Forbidden`], and connectivity failures
/// [`Error::StoreUnavailable`].
pub trait ShelfStore: Send + Sync {
  type Error: std::error::Error + Into<Error> + Send + Sync + 'static;

  // ── users ─────────────────────────────────────────────────────────────

  /// Write the profile document keyed by `profile.user_id`.
  fn put_profile(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  // ── userBooks ─────────────────────────────────────────────────────────

  /// Insert a library entry. `entry_id` and `added_at` are set by the store.
  fn insert_entry(
    &self,
    entry: NewLibraryEntry,
  ) -> impl Future<Output = Result<LibraryEntry, Self::Error>> + Send + '_;

  /// Entries owned by `user_id`, oldest first; optionally restricted to one
  /// book.
  fn find_entries(
    &self,
    user_id: UserId,
    book_id: Option<BookId>,
  ) -> impl Future<Output = Result<Vec<LibraryEntry>, Self::Error>> + Send + '_;

  /// Delete an entry if it exists and is owned by `owner`. Returns whether a
  /// document was removed.
  fn delete_entry(
    &self,
    owner: UserId,
    entry_id: EntryId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── reviews ───────────────────────────────────────────────────────────

  /// Insert a review. `review_id` and `created_at` are set by the store.
  fn insert_review(
    &self,
    review: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Look up one review by id, including a deleted one's tombstone.
  fn get_review(
    &self,
    review_id: ReviewId,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + '_;

  /// Live reviews matching `query`; tombstones are skipped.
  fn find_reviews(
    &self,
    query: ReviewQuery,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  /// Replace comment and rating of a review authored by `requester` and
  /// stamp `updated_at`. A deleted review fails with
  /// [`Error::InvalidTransition`].
  fn update_review(
    &self,
    requester: UserId,
    review_id: ReviewId,
    patch: ReviewPatch,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Tombstone a review authored by `requester` by stamping `deleted_at`.
  /// Returns `false` if no live review with that id exists.
  fn delete_review(
    &self,
    requester: UserId,
    review_id: ReviewId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
