//! Async HTTP client wrapping the Shelf JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use shelf_api::{account::SessionBody, reviews::BookReviews};
use shelf_core::{
  account::{ProfileSummary, RegistrationForm},
  book::CatalogBook,
  id::{BookId, EntryId, ReviewId},
  library::{CatalogListing, LibraryEntry},
  review::{Review, ReviewDraft},
};

/// Connection settings for the Shelf API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub token:    Option<String>,
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error:     String,
  #[serde(default)]
  retryable: bool,
}

/// Async HTTP client for the Shelf JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send `req`, turning non-2xx responses into an error carrying the
  /// server's message.
  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = req.send().await.with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    match resp.json::<ErrorBody>().await {
      Ok(body) if body.retryable => bail!("{what}: {} (temporary, try again)", body.error),
      Ok(body) => bail!("{what}: {}", body.error),
      Err(_) => Err(anyhow!("{what} → {status}")),
    }
  }

  async fn json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
    self
      .send(req, what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"))
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  /// `POST /api/auth/register`
  pub async fn register(&self, form: &RegistrationForm) -> Result<SessionBody> {
    self
      .json(self.request(Method::POST, "/auth/register").json(form), "register")
      .await
  }

  /// `POST /api/auth/login`
  pub async fn login(&self, email: &str, password: &str) -> Result<SessionBody> {
    let body = json!({ "email": email, "password": password });
    self
      .json(self.request(Method::POST, "/auth/login").json(&body), "login")
      .await
  }

  /// `POST /api/auth/logout`
  pub async fn logout(&self) -> Result<()> {
    self.send(self.request(Method::POST, "/auth/logout"), "logout").await?;
    Ok(())
  }

  /// `GET /api/profile`
  pub async fn profile(&self) -> Result<ProfileSummary> {
    self.json(self.request(Method::GET, "/profile"), "profile").await
  }

  // ── Catalog & library ─────────────────────────────────────────────────────

  /// `GET /api/catalog`
  pub async fn catalog(&self) -> Result<Vec<CatalogListing>> {
    self.json(self.request(Method::GET, "/catalog"), "catalog").await
  }

  /// Look a book up in the annotated catalog.
  pub async fn find_book(&self, book_id: &BookId) -> Result<CatalogBook> {
    self
      .catalog()
      .await?
      .into_iter()
      .map(|listing| listing.book)
      .find(|book| &book.id == book_id)
      .ok_or_else(|| anyhow!("no book {book_id} in the catalog"))
  }

  /// `GET /api/library`
  pub async fn library(&self) -> Result<Vec<LibraryEntry>> {
    self.json(self.request(Method::GET, "/library"), "library").await
  }

  /// `POST /api/library`
  pub async fn add_to_library(&self, book: &CatalogBook) -> Result<LibraryEntry> {
    self
      .json(self.request(Method::POST, "/library").json(book), "add to library")
      .await
  }

  /// `DELETE /api/library/{entry_id}`
  pub async fn remove_from_library(&self, entry_id: &EntryId) -> Result<()> {
    let path = format!("/library/{entry_id}");
    self
      .send(self.request(Method::DELETE, &path), "remove from library")
      .await?;
    Ok(())
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  /// `GET /api/books/{book_id}/reviews`
  pub async fn book_reviews(&self, book_id: &BookId) -> Result<BookReviews> {
    let path = format!("/books/{book_id}/reviews");
    self.json(self.request(Method::GET, &path), "reviews").await
  }

  /// `POST /api/reviews`
  pub async fn submit_review(&self, draft: &ReviewDraft) -> Result<Review> {
    self
      .json(self.request(Method::POST, "/reviews").json(draft), "submit review")
      .await
  }

  /// `PUT /api/reviews/{review_id}`
  pub async fn edit_review(&self, review_id: &ReviewId, comment: &str, rating: u8) -> Result<Review> {
    #[derive(Serialize)]
    struct Body<'a> {
      comment: &'a str,
      rating:  u8,
    }
    let path = format!("/reviews/{review_id}");
    self
      .json(
        self.request(Method::PUT, &path).json(&Body { comment, rating }),
        "edit review",
      )
      .await
  }

  /// `DELETE /api/reviews/{review_id}`
  pub async fn delete_review(&self, review_id: &ReviewId) -> Result<()> {
    let path = format!("/reviews/{review_id}");
    self.send(self.request(Method::DELETE, &path), "delete review").await?;
    Ok(())
  }
}
