//! [`SqliteStore`], the SQLite implementation of [`ShelfStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension as _};
use tracing::{debug, warn};

use shelf_core::{
  account::UserProfile,
  id::{BookId, EntryId, ReviewId, UserId},
  library::{LibraryEntry, NewLibraryEntry},
  review::{NewReview, Review, ReviewEvent, ReviewPatch, ReviewState},
  store::{ReviewFilter, ReviewOrder, ReviewQuery, ShelfStore},
};

use crate::{
  Error, Result,
  encode::{ENTRY_COLUMNS, REVIEW_COLUMNS, RawEntry, RawProfile, RawReview, encode_dt, encode_list},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Shelf document store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// Whether a review row exists and who wrote it, read in the same call as the
/// write that depends on it.
enum Authorship {
  Missing,
  Foreign,
  Deleted,
  Owned(Option<RawReview>),
}

/// A `UNIQUE` constraint failure; CHECK and NOT NULL failures do not count.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == ErrorCode::ConstraintViolation
        && f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Check authorship of `review_id` and, if it is live and owned by
  /// `requester`, run `write` on the same connection turn.
  async fn with_authorship<F>(
    &self,
    requester: &UserId,
    review_id: &ReviewId,
    write: F,
  ) -> Result<Authorship>
  where
    F: FnOnce(&rusqlite::Connection, &str) -> rusqlite::Result<Option<RawReview>>
      + Send
      + 'static,
  {
    let requester = requester.as_str().to_owned();
    let review_id = review_id.as_str().to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let author: Option<(String, bool)> = conn
          .query_row(
            "SELECT user_id, deleted_at IS NOT NULL FROM reviews WHERE review_id = ?1",
            rusqlite::params![review_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        Ok(match author {
          None => Authorship::Missing,
          Some((a, _)) if a != requester => Authorship::Foreign,
          Some((_, true)) => Authorship::Deleted,
          Some((_, false)) => Authorship::Owned(write(conn, &review_id)?),
        })
      })
      .await?;
    Ok(outcome)
  }
}

// ─── ShelfStore impl ─────────────────────────────────────────────────────────

impl ShelfStore for SqliteStore {
  type Error = Error;

  // ── users ─────────────────────────────────────────────────────────────────

  async fn put_profile(&self, profile: UserProfile) -> Result<()> {
    let at_str = encode_dt(profile.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO users (user_id, email, first_name, last_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            profile.user_id.as_str(),
            profile.email,
            profile.first_name,
            profile.last_name,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, email, first_name, last_name, created_at
             FROM users WHERE user_id = ?1",
            rusqlite::params![user_id.as_str()],
            |row| {
              Ok(RawProfile {
                user_id:    row.get(0)?,
                email:      row.get(1)?,
                first_name: row.get(2)?,
                last_name:  row.get(3)?,
                created_at: row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  // ── userBooks ─────────────────────────────────────────────────────────────

  async fn insert_entry(&self, input: NewLibraryEntry) -> Result<LibraryEntry> {
    let entry = LibraryEntry {
      entry_id:       EntryId::generate(),
      user_id:        input.user_id,
      book_id:        input.book_id,
      book_title:     input.book_title,
      authors:        input.authors,
      image_links:    input.image_links,
      description:    input.description,
      categories:     input.categories,
      publisher:      input.publisher,
      published_date: input.published_date,
      added_at:       Utc::now(),
    };

    let entry_id_str    = entry.entry_id.to_string();
    let user_id_str     = entry.user_id.to_string();
    let book_id_str     = entry.book_id.to_string();
    let title           = entry.book_title.clone();
    let authors_str     = encode_list(&entry.authors)?;
    let thumbnail       = entry.image_links.thumbnail.clone();
    let small_thumbnail = entry.image_links.small_thumbnail.clone();
    let description     = entry.description.clone();
    let categories_str  = encode_list(&entry.categories)?;
    let publisher       = entry.publisher.clone();
    let published_date  = entry.published_date.clone();
    let added_at_str    = encode_dt(entry.added_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO user_books (
             entry_id, user_id, book_id, book_title, authors, thumbnail,
             small_thumbnail, description, categories, publisher,
             published_date, added_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            entry_id_str,
            user_id_str,
            book_id_str,
            title,
            authors_str,
            thumbnail,
            small_thumbnail,
            description,
            categories_str,
            publisher,
            published_date,
            added_at_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      warn!(user_id = %entry.user_id, book_id = %entry.book_id, "duplicate library insert rejected");
      return Err(shelf_core::Error::AlreadyMember(entry.book_id).into());
    }
    Ok(entry)
  }

  async fn find_entries(
    &self,
    user_id: UserId,
    book_id: Option<BookId>,
  ) -> Result<Vec<LibraryEntry>> {
    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(book_id) = book_id {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM user_books
             WHERE user_id = ?1 AND book_id = ?2 ORDER BY rowid"
          ))?;
          stmt
            .query_map(
              rusqlite::params![user_id.as_str(), book_id.as_str()],
              RawEntry::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM user_books WHERE user_id = ?1 ORDER BY rowid"
          ))?;
          stmt
            .query_map(rusqlite::params![user_id.as_str()], RawEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn delete_entry(&self, owner: UserId, entry_id: EntryId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM user_books WHERE entry_id = ?1 AND user_id = ?2",
          rusqlite::params![entry_id.as_str(), owner.as_str()],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── reviews ───────────────────────────────────────────────────────────────

  async fn insert_review(&self, input: NewReview) -> Result<Review> {
    let review = Review {
      review_id:  ReviewId::generate(),
      book_id:    input.book_id,
      book_title: input.book_title,
      user_id:    input.user_id,
      comment:    input.comment,
      rating:     input.rating,
      created_at: Utc::now(),
      updated_at: None,
      deleted_at: None,
    };

    let review_id_str = review.review_id.to_string();
    let book_id_str   = review.book_id.to_string();
    let title         = review.book_title.clone();
    let user_id_str   = review.user_id.to_string();
    let comment       = review.comment.to_string();
    let rating        = review.rating.get();
    let at_str        = encode_dt(review.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reviews (review_id, book_id, book_title, user_id, comment, rating, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![review_id_str, book_id_str, title, user_id_str, comment, rating, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(review)
  }

  async fn get_review(&self, review_id: ReviewId) -> Result<Option<Review>> {
    let raw: Option<RawReview> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE review_id = ?1"),
            rusqlite::params![review_id.as_str()],
            RawReview::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawReview::into_review).transpose()
  }

  async fn find_reviews(&self, query: ReviewQuery) -> Result<Vec<Review>> {
    let (column, key) = match query.filter {
      ReviewFilter::Book(b) => ("book_id", b.into_inner()),
      ReviewFilter::Author(u) => ("user_id", u.into_inner()),
    };
    let order = match query.order {
      ReviewOrder::Stored => "rowid",
      ReviewOrder::NewestFirst => "created_at DESC, rowid DESC",
    };

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews
           WHERE {column} = ?1 AND deleted_at IS NULL ORDER BY {order}"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![key], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }

  async fn update_review(
    &self,
    requester: UserId,
    review_id: ReviewId,
    patch: ReviewPatch,
  ) -> Result<Review> {
    let comment = patch.comment.to_string();
    let rating  = patch.rating.get();
    let at_str  = encode_dt(Utc::now());

    let outcome = self
      .with_authorship(&requester, &review_id, move |conn, id| {
        conn.execute(
          "UPDATE reviews SET comment = ?1, rating = ?2, updated_at = ?3 WHERE review_id = ?4",
          rusqlite::params![comment, rating, at_str, id],
        )?;
        conn
          .query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE review_id = ?1"),
            rusqlite::params![id],
            RawReview::from_row,
          )
          .optional()
      })
      .await?;

    match outcome {
      Authorship::Owned(Some(raw)) => raw.into_review(),
      Authorship::Missing | Authorship::Owned(None) => {
        Err(shelf_core::Error::NotFound(format!("review {review_id}")).into())
      }
      Authorship::Deleted => Err(
        shelf_core::Error::InvalidTransition {
          from:  ReviewState::Deleted,
          event: ReviewEvent::Edit,
        }
        .into(),
      ),
      Authorship::Foreign => {
        debug!(%review_id, %requester, "review update by non-author rejected");
        Err(shelf_core::Error::Forbidden.into())
      }
    }
  }

  async fn delete_review(&self, requester: UserId, review_id: ReviewId) -> Result<bool> {
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .with_authorship(&requester, &review_id, move |conn, id| {
        conn.execute(
          "UPDATE reviews SET deleted_at = ?1 WHERE review_id = ?2",
          rusqlite::params![at_str, id],
        )?;
        Ok(None)
      })
      .await?;

    match outcome {
      Authorship::Owned(_) => Ok(true),
      Authorship::Missing | Authorship::Deleted => Ok(false),
      Authorship::Foreign => {
        debug!(%review_id, %requester, "review delete by non-author rejected");
        Err(shelf_core::Error::Forbidden.into())
      }
    }
  }
}
