//! Catalog book records, as served by the remote catalog.
//!
//! The application never mutates a [`CatalogBook`]. Library entries and
//! reviews copy the display fields they need, so they keep rendering after a
//! book disappears from the catalog.

use serde::{Deserialize, Serialize};

use crate::id::BookId;

/// Cover image URLs. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub small_thumbnail: Option<String>,
}

impl ImageLinks {
  pub fn is_empty(&self) -> bool {
    self.thumbnail.is_none() && self.small_thumbnail.is_none()
  }
}

/// A book record from the catalog. Field names follow the catalog's
/// camelCase JSON; everything except `id` and `title` defaults when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogBook {
  pub id:             BookId,
  pub title:          String,
  #[serde(default)]
  pub authors:        Vec<String>,
  #[serde(default)]
  pub description:    String,
  #[serde(default)]
  pub image_links:    ImageLinks,
  #[serde(default)]
  pub categories:     Vec<String>,
  #[serde(default)]
  pub publisher:      String,
  #[serde(default)]
  pub published_date: String,
}

impl CatalogBook {
  /// Minimal record with only the required fields set.
  pub fn new(id: impl Into<BookId>, title: impl Into<String>) -> Self {
    Self {
      id:             id.into(),
      title:          title.into(),
      authors:        Vec::new(),
      description:    String::new(),
      image_links:    ImageLinks::default(),
      categories:     Vec::new(),
      publisher:      String::new(),
      published_date: String::new(),
    }
  }

  /// Authors joined for a one-line byline.
  pub fn byline(&self) -> String { self.authors.join(", ") }
}
