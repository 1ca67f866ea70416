//! [`HttpCatalog`], the reqwest implementation of [`CatalogClient`].

use std::time::Duration;

use reqwest::{Client, header};
use serde::Deserialize;
use tracing::{debug, warn};

use shelf_core::{book::CatalogBook, catalog::CatalogClient};

use crate::{Error, Result};

/// Where the catalog lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
  /// Base URL without the `/books` path, e.g. `https://books.example.com`.
  pub base_url: String,
  /// Sent as-is in the `Authorization` header.
  pub token:    String,
  pub timeout:  Duration,
}

impl CatalogConfig {
  pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), token: token.into(), timeout: Duration::from_secs(30) }
  }
}

#[derive(Deserialize)]
struct BooksEnvelope {
  books: Vec<CatalogBook>,
}

/// Parse a catalog response body.
pub fn decode_books(body: &[u8]) -> Result<Vec<CatalogBook>> {
  let envelope: BooksEnvelope = serde_json::from_slice(body)?;
  Ok(envelope.books)
}

/// Catalog client over HTTP.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpCatalog {
  client: Client,
  config: CatalogConfig,
}

impl HttpCatalog {
  pub fn new(config: CatalogConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn books_url(&self) -> String { format!("{}/books", self.config.base_url.trim_end_matches('/')) }
}

impl CatalogClient for HttpCatalog {
  type Error = Error;

  async fn list_books(&self) -> Result<Vec<CatalogBook>> {
    let url = self.books_url();
    let resp = self
      .client
      .get(&url)
      .header(header::AUTHORIZATION, &self.config.token)
      .header(header::ACCEPT, "application/json")
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      warn!(%url, %status, "catalog request failed");
      return Err(Error::Status(status));
    }

    let body = resp.bytes().await?;
    let books = decode_books(&body)?;
    debug!(count = books.len(), "fetched catalog");
    Ok(books)
  }
}
