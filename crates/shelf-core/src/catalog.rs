//! The `CatalogClient` trait — read-only access to the remote book catalog.
//!
//! Implemented by `shelf-catalog` over HTTP. The bearer token is part of the
//! client's configuration, not of each call.

use std::future::Future;

use crate::{Error, book::CatalogBook};

pub trait CatalogClient: Send + Sync {
  type Error: std::error::Error + Into<Error> + Send + Sync + 'static;

  /// Fetch the full catalog in one request. No pagination.
  fn list_books(
    &self,
  ) -> impl Future<Output = Result<Vec<CatalogBook>, Self::Error>> + Send + '_;
}
