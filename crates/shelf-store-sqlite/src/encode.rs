//! Encoding and decoding helpers between Shelf domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 UTC strings, so text order equals time
//! order. String lists (authors, categories) are compact JSON arrays.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use shelf_core::{
  account::UserProfile,
  book::ImageLinks,
  id::{BookId, EntryId, ReviewId, UserId},
  library::LibraryEntry,
  review::{Comment, Rating, Review},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── String lists ────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ENTRY_COLUMNS: &str = "entry_id, user_id, book_id, book_title, authors, thumbnail, \
                                 small_thumbnail, description, categories, publisher, \
                                 published_date, added_at";

/// Raw values read directly from a `user_books` row.
pub struct RawEntry {
  pub entry_id:        String,
  pub user_id:         String,
  pub book_id:         String,
  pub book_title:      String,
  pub authors:         String,
  pub thumbnail:       Option<String>,
  pub small_thumbnail: Option<String>,
  pub description:     String,
  pub categories:      String,
  pub publisher:       String,
  pub published_date:  String,
  pub added_at:        String,
}

impl RawEntry {
  /// Map a row selected with [`ENTRY_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:        row.get(0)?,
      user_id:         row.get(1)?,
      book_id:         row.get(2)?,
      book_title:      row.get(3)?,
      authors:         row.get(4)?,
      thumbnail:       row.get(5)?,
      small_thumbnail: row.get(6)?,
      description:     row.get(7)?,
      categories:      row.get(8)?,
      publisher:       row.get(9)?,
      published_date:  row.get(10)?,
      added_at:        row.get(11)?,
    })
  }

  pub fn into_entry(self) -> Result<LibraryEntry> {
    Ok(LibraryEntry {
      entry_id:       EntryId::from(self.entry_id),
      user_id:        UserId::from(self.user_id),
      book_id:        BookId::from(self.book_id),
      book_title:     self.book_title,
      authors:        decode_list(&self.authors)?,
      image_links:    ImageLinks {
        thumbnail:       self.thumbnail,
        small_thumbnail: self.small_thumbnail,
      },
      description:    self.description,
      categories:     decode_list(&self.categories)?,
      publisher:      self.publisher,
      published_date: self.published_date,
      added_at:       decode_dt(&self.added_at)?,
    })
  }
}

pub const REVIEW_COLUMNS: &str =
  "review_id, book_id, book_title, user_id, comment, rating, created_at, updated_at, deleted_at";

/// Raw values read directly from a `reviews` row.
pub struct RawReview {
  pub review_id:  String,
  pub book_id:    String,
  pub book_title: String,
  pub user_id:    String,
  pub comment:    String,
  pub rating:     i64,
  pub created_at: String,
  pub updated_at: Option<String>,
  pub deleted_at: Option<String>,
}

impl RawReview {
  /// Map a row selected with [`REVIEW_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:  row.get(0)?,
      book_id:    row.get(1)?,
      book_title: row.get(2)?,
      user_id:    row.get(3)?,
      comment:    row.get(4)?,
      rating:     row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
      deleted_at: row.get(8)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    let rating = u8::try_from(self.rating)
      .ok()
      .and_then(|r| Rating::new(r).ok())
      .ok_or_else(|| Error::Corrupt(format!("review {}: rating {}", self.review_id, self.rating)))?;
    let comment = Comment::parse(&self.comment)
      .map_err(|e| Error::Corrupt(format!("review {}: {e}", self.review_id)))?;

    Ok(Review {
      book_id: BookId::from(self.book_id),
      book_title: self.book_title,
      user_id: UserId::from(self.user_id),
      comment,
      rating,
      created_at: decode_dt(&self.created_at)?,
      updated_at: self.updated_at.as_deref().map(decode_dt).transpose()?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
      review_id: ReviewId::from(self.review_id),
    })
  }
}

/// Raw values read directly from a `users` row.
pub struct RawProfile {
  pub user_id:    String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub created_at: String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      user_id:    UserId::from(self.user_id),
      email:      self.email,
      first_name: self.first_name,
      last_name:  self.last_name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
