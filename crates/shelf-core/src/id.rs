//! Identifier newtypes.
//!
//! Ids are opaque strings. Catalog ids come from the catalog service, user ids
//! from the identity provider; entry and review ids are assigned by the store
//! as hyphenated UUID v4 strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

      /// A fresh random id.
      pub fn generate() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

      pub fn as_str(&self) -> &str { &self.0 }

      pub fn into_inner(self) -> String { self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(s: &str) -> Self { Self(s.to_owned()) }
    }

    impl From<String> for $name {
      fn from(s: String) -> Self { Self(s) }
    }
  };
}

string_id!(
  /// Session identity of a signed-in user.
  UserId
);
string_id!(
  /// Catalog-assigned book id.
  BookId
);
string_id!(
  /// Primary key of a library entry.
  EntryId
);
string_id!(
  /// Primary key of a review.
  ReviewId
);
string_id!(
  /// Bearer token naming a live session.
  SessionToken
);
