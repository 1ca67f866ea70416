//! HTTP client for the remote book catalog.
//!
//! The catalog is read-only and unpaginated: one `GET {base_url}/books`
//! returns every book as `{ "books": [...] }`. Requests carry the configured
//! token verbatim in the `Authorization` header.

mod client;

pub mod error;

pub use client::{CatalogConfig, HttpCatalog, decode_books};
pub use error::{Error, Result};
