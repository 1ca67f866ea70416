//! Error type for `shelf-catalog`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("catalog responded with {0}")]
  Status(reqwest::StatusCode),

  #[error("malformed catalog response: {0}")]
  Decode(#[from] serde_json::Error),
}

impl From<Error> for shelf_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Decode(json) => shelf_core::Error::Serialization(json),
      other => shelf_core::Error::unavailable(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
