//! Library entries and the membership tracker.
//!
//! A user's library is the set of `userBooks` documents they own. At most one
//! entry exists per `(user_id, book_id)`. The tracker checks before inserting;
//! backends that can enforce the pair as a unique key report the race loser
//! as [`Error::AlreadyMember`] too.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
  Error, Result,
  error::from_backend,
  book::{CatalogBook, ImageLinks},
  id::{BookId, EntryId, UserId},
  identity::{Session, require},
  store::ShelfStore,
};

// ─── Entries ─────────────────────────────────────────────────────────────────

/// A user's saved reference to a catalog book, with the book's display fields
/// copied in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
  pub entry_id:       EntryId,
  pub user_id:        UserId,
  pub book_id:        BookId,
  pub book_title:     String,
  pub authors:        Vec<String>,
  pub image_links:    ImageLinks,
  pub description:    String,
  pub categories:     Vec<String>,
  pub publisher:      String,
  pub published_date: String,
  /// Server-assigned; never changes.
  pub added_at:       DateTime<Utc>,
}

/// Input to [`ShelfStore::insert_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLibraryEntry {
  pub user_id:        UserId,
  pub book_id:        BookId,
  pub book_title:     String,
  pub authors:        Vec<String>,
  pub image_links:    ImageLinks,
  pub description:    String,
  pub categories:     Vec<String>,
  pub publisher:      String,
  pub published_date: String,
}

impl NewLibraryEntry {
  /// Copy `book`'s display fields into an entry owned by `user_id`.
  pub fn from_book(user_id: UserId, book: &CatalogBook) -> Self {
    Self {
      user_id,
      book_id:        book.id.clone(),
      book_title:     book.title.clone(),
      authors:        book.authors.clone(),
      image_links:    book.image_links.clone(),
      description:    book.description.clone(),
      categories:     book.categories.clone(),
      publisher:      book.publisher.clone(),
      published_date: book.published_date.clone(),
    }
  }
}

// ─── Membership ──────────────────────────────────────────────────────────────

/// The set of book ids in one user's library, read in a single query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet(HashSet<BookId>);

impl MembershipSet {
  pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LibraryEntry>) -> Self {
    Self(entries.into_iter().map(|e| e.book_id.clone()).collect())
  }

  pub fn contains(&self, book_id: &BookId) -> bool { self.0.contains(book_id) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// A catalog book plus whether the viewer already saved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListing {
  #[serde(flatten)]
  pub book:       CatalogBook,
  pub in_library: bool,
}

/// Mark each book of a catalog page with its membership.
pub fn annotate(books: Vec<CatalogBook>, members: &MembershipSet) -> Vec<CatalogListing> {
  books
    .into_iter()
    .map(|book| {
      let in_library = members.contains(&book.id);
      CatalogListing { book, in_library }
    })
    .collect()
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

/// Add/remove/check library membership against the store.
///
/// Holds no cached state: every call reads the store again, since the store
/// never pushes changes.
pub struct LibraryTracker<S> {
  store: Arc<S>,
}

impl<S> Clone for LibraryTracker<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: ShelfStore> LibraryTracker<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Whether `user_id` has an entry for `book_id`.
  pub async fn is_member(&self, user_id: &UserId, book_id: &BookId) -> Result<bool> {
    let found = self
      .store
      .find_entries(user_id.clone(), Some(book_id.clone()))
      .await
      .map_err(from_backend)?;
    Ok(!found.is_empty())
  }

  /// Every book id in the user's library, for annotating a whole catalog page
  /// with one query.
  pub async fn membership(&self, user_id: &UserId) -> Result<MembershipSet> {
    let entries = self
      .store
      .find_entries(user_id.clone(), None)
      .await
      .map_err(from_backend)?;
    Ok(MembershipSet::from_entries(&entries))
  }

  /// The caller's library, oldest addition first.
  pub async fn list(&self, session: Option<&Session>) -> Result<Vec<LibraryEntry>> {
    let session = require(session)?;
    self
      .store
      .find_entries(session.user_id.clone(), None)
      .await
      .map_err(Into::into)
  }

  /// Save `book` to the caller's library.
  pub async fn add(
    &self,
    session: Option<&Session>,
    book: &CatalogBook,
  ) -> Result<LibraryEntry> {
    let session = require(session)?;

    // The check and the insert run back to back; the window between them is
    // closed only by a backend unique key.
    if self.is_member(&session.user_id, &book.id).await? {
      debug!(user_id = %session.user_id, book_id = %book.id, "book already in library");
      return Err(Error::AlreadyMember(book.id.clone()));
    }

    let entry = self
      .store
      .insert_entry(NewLibraryEntry::from_book(session.user_id.clone(), book))
      .await
      .map_err(from_backend)?;

    info!(
      user_id = %entry.user_id,
      book_id = %entry.book_id,
      entry_id = %entry.entry_id,
      "added book to library"
    );
    Ok(entry)
  }

  /// Remove one of the caller's entries. Absent or foreign ids are a no-op
  /// and return `false`.
  pub async fn remove(&self, session: Option<&Session>, entry_id: &EntryId) -> Result<bool> {
    let session = require(session)?;
    let removed = self
      .store
      .delete_entry(session.user_id.clone(), entry_id.clone())
      .await
      .map_err(from_backend)?;

    if removed {
      info!(user_id = %session.user_id, %entry_id, "removed book from library");
    } else {
      debug!(user_id = %session.user_id, %entry_id, "library entry already absent");
    }
    Ok(removed)
  }
}
