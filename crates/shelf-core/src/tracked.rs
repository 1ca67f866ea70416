//! Client-side snapshots of remote collections with an explicit `refresh()`.
//!
//! The store never pushes changes, so a view re-reads whenever the
//! presentation asks it to. A
//! refresh result is applied only if it is still the latest one requested and
//! the view is still attached; anything else is dropped on arrival. The
//! underlying request is not aborted.

use std::{
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use crate::{
  Result,
  aggregate::{self, RatingSummary},
  id::BookId,
  identity::Session,
  library::{LibraryEntry, LibraryTracker, MembershipSet},
  review::{Review, ReviewManager},
  store::ShelfStore,
};

/// What happened to a refresh result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
  Applied,
  /// A newer refresh started, or the view was detached, while this one was
  /// in flight.
  Discarded,
}

struct TrackedState<T> {
  value:      T,
  generation: u64,
  attached:   bool,
}

/// Shared handle to the last applied snapshot of a collection.
///
/// Cloning is cheap; clones observe the same snapshot.
pub struct Tracked<T> {
  inner: Arc<Mutex<TrackedState<T>>>,
}

impl<T> Clone for Tracked<T> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<T: Clone> Tracked<T> {
  pub fn new(initial: T) -> Self {
    Self {
      inner: Arc::new(Mutex::new(TrackedState { value: initial, generation: 0, attached: true })),
    }
  }

  fn lock(&self) -> MutexGuard<'_, TrackedState<T>> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn snapshot(&self) -> T { self.lock().value.clone() }

  /// The owning view went away; results still in flight are dropped.
  pub fn detach(&self) {
    let mut state = self.lock();
    state.attached = false;
    state.generation += 1;
  }

  /// The owning view is visible again.
  pub fn attach(&self) { self.lock().attached = true; }

  pub fn is_attached(&self) -> bool { self.lock().attached }

  /// Run `fetch` and apply its value unless it went stale meanwhile. Fetch
  /// errors are returned as-is and leave the snapshot untouched.
  pub async fn refresh<F>(&self, fetch: F) -> Result<RefreshOutcome>
  where
    F: Future<Output = Result<T>>,
  {
    let ticket = {
      let mut state = self.lock();
      state.generation += 1;
      state.generation
    };

    let value = fetch.await?;

    let mut state = self.lock();
    if !state.attached || state.generation != ticket {
      debug!(ticket, current = state.generation, "discarding stale refresh");
      return Ok(RefreshOutcome::Discarded);
    }
    state.value = value;
    Ok(RefreshOutcome::Applied)
  }
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// The signed-in user's library as last fetched.
pub struct LibraryView<S> {
  tracker: LibraryTracker<S>,
  session: Session,
  entries: Tracked<Vec<LibraryEntry>>,
}

impl<S: ShelfStore> LibraryView<S> {
  pub fn new(tracker: LibraryTracker<S>, session: Session) -> Self {
    Self { tracker, session, entries: Tracked::new(Vec::new()) }
  }

  pub async fn refresh(&self) -> Result<RefreshOutcome> {
    self.entries.refresh(self.tracker.list(Some(&self.session))).await
  }

  pub fn entries(&self) -> Vec<LibraryEntry> { self.entries.snapshot() }

  /// Membership derived from the current snapshot, for marking catalog books.
  pub fn membership(&self) -> MembershipSet { MembershipSet::from_entries(&self.entries.snapshot()) }

  /// Handle for detaching from outside an in-flight refresh.
  pub fn handle(&self) -> Tracked<Vec<LibraryEntry>> { self.entries.clone() }
}

/// One book's reviews as last fetched, newest first.
pub struct BookReviewsView<S> {
  reviews: ReviewManager<S>,
  book_id: BookId,
  viewer:  Option<Session>,
  current: Tracked<Vec<Review>>,
}

impl<S: ShelfStore> BookReviewsView<S> {
  pub fn new(reviews: ReviewManager<S>, book_id: BookId, viewer: Option<Session>) -> Self {
    Self { reviews, book_id, viewer, current: Tracked::new(Vec::new()) }
  }

  pub async fn refresh(&self) -> Result<RefreshOutcome> {
    self.current.refresh(self.reviews.for_book(&self.book_id)).await
  }

  pub fn reviews(&self) -> Vec<Review> { self.current.snapshot() }

  pub fn summary(&self) -> RatingSummary { aggregate::summarize(&self.current.snapshot()) }

  /// Whether the viewer may be offered Edit/Delete on `review`.
  pub fn can_edit(&self, review: &Review) -> bool {
    self
      .viewer
      .as_ref()
      .is_some_and(|s| aggregate::is_owner(review, &s.user_id))
  }

  pub fn handle(&self) -> Tracked<Vec<Review>> { self.current.clone() }
}
