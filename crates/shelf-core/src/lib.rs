//! Core types and rules for Shelf: the personal library, reviews, and the
//! rating aggregates derived from them.
//!
//! No HTTP or database code lives here. The document store, identity provider
//! and catalog are reached through the traits in [`store`], [`identity`] and
//! [`catalog`]; every operation takes the caller's
//! [`Session`](identity::Session) explicitly.

// Trait methods return `impl Future + Send`; implementors use `async fn`.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod aggregate;
pub mod book;
pub mod catalog;
pub mod error;
pub mod id;
pub mod identity;
pub mod library;
pub mod review;
pub mod store;
pub mod tracked;

pub use error::{Error, Result, ValidationError};

#[cfg(test)]
mod memory;
#[cfg(test)]
mod tests;
