//! Error type for `shelf-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] shelf_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row no longer satisfies the domain rules (e.g. a rating
  /// outside 1..=5 written by another tool).
  #[error("corrupt row: {0}")]
  Corrupt(String),

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("blocking task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl From<Error> for shelf_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => shelf_core::Error::unavailable(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
