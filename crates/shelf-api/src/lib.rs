//! JSON API for Shelf.
//!
//! Exposes an axum [`Router`] over a backend that is both the document store
//! and the identity provider (see [`Backend`]) plus a [`CatalogClient`].
//! Requests authenticate with `Authorization: Bearer <session token>`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/auth/register` | registration form → 201 session |
//! | `POST` | `/api/auth/login` | `{"email","password"}` → session |
//! | `POST` | `/api/auth/logout` | 204 |
//! | `GET`  | `/api/catalog` | catalog with `in_library` flags |
//! | `GET`  | `/api/library` | caller's entries |
//! | `POST` | `/api/library` | body: catalog book → 201; 409 if present |
//! | `DELETE` | `/api/library/{entry_id}` | 204, idempotent |
//! | `GET`  | `/api/books/{book_id}/reviews` | summary + newest-first reviews |
//! | `POST` | `/api/reviews` | body: review draft → 201 |
//! | `PUT`  | `/api/reviews/{id}` | `{"comment","rating"}` |
//! | `DELETE` | `/api/reviews/{id}` | 204 |
//! | `GET`  | `/api/profile` | profile summary |

pub mod account;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod library;
pub mod reviews;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use serde::Deserialize;
use shelf_core::{
  catalog::CatalogClient, identity::IdentityProvider, library::LibraryTracker,
  review::ReviewManager, store::ShelfStore,
};
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SHELF_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub store_path:    PathBuf,
  /// Base URL of the book catalog service.
  pub catalog_url:   String,
  /// Sent verbatim in the catalog's `Authorization` header.
  pub catalog_token: String,
}

// ─── Application state ───────────────────────────────────────────────────────

/// A store that also issues and resolves sessions.
pub trait Backend: ShelfStore + IdentityProvider + 'static {}

impl<T: ShelfStore + IdentityProvider + 'static> Backend for T {}

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C> {
  pub store:   Arc<S>,
  pub catalog: Arc<C>,
  pub library: LibraryTracker<S>,
  pub reviews: ReviewManager<S>,
}

impl<S: Backend, C: CatalogClient> AppState<S, C> {
  pub fn new(store: Arc<S>, catalog: Arc<C>) -> Self {
    Self {
      library: LibraryTracker::new(store.clone()),
      reviews: ReviewManager::new(store.clone()),
      store,
      catalog,
    }
  }
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      catalog: Arc::clone(&self.catalog),
      library: self.library.clone(),
      reviews: self.reviews.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`, mounted under `/api`.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: Backend,
  C: CatalogClient + 'static,
{
  let api = Router::new()
    // Accounts
    .route("/auth/register", post(account::register::<S, C>))
    .route("/auth/login", post(account::login::<S, C>))
    .route("/auth/logout", post(account::logout::<S, C>))
    .route("/profile", get(account::profile::<S, C>))
    // Catalog
    .route("/catalog", get(catalog::list::<S, C>))
    // Library
    .route("/library", get(library::list::<S, C>).post(library::add::<S, C>))
    .route("/library/{entry_id}", delete(library::remove::<S, C>))
    // Reviews
    .route("/books/{book_id}/reviews", get(reviews::for_book::<S, C>))
    .route("/reviews", post(reviews::submit::<S, C>))
    .route(
      "/reviews/{review_id}",
      put(reviews::update::<S, C>).delete(reviews::remove::<S, C>),
    )
    .with_state(state);

  Router::new().nest("/api", api).layer(TraceLayer::new_for_http())
}
