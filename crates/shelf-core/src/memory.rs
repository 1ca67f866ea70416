//! In-memory `ShelfStore` + `IdentityProvider` used by the core test suite.

use std::{
  collections::HashMap,
  sync::{
    RwLock,
    atomic::{AtomicBool, AtomicI64, Ordering},
  },
};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
  Error, Result,
  account::UserProfile,
  id::{BookId, EntryId, ReviewId, SessionToken, UserId},
  identity::{AuthError, IdentityProvider, Session},
  library::{LibraryEntry, NewLibraryEntry},
  review::{NewReview, Review, ReviewEvent, ReviewPatch},
  store::{ReviewFilter, ReviewOrder, ReviewQuery, ShelfStore},
};

#[derive(Default)]
pub struct MemoryStore {
  profiles: RwLock<HashMap<UserId, UserProfile>>,
  entries:  RwLock<Vec<LibraryEntry>>,
  reviews:  RwLock<Vec<Review>>,
  /// email -> (user id, plaintext password)
  accounts: RwLock<HashMap<String, (UserId, String)>>,
  sessions: RwLock<HashMap<SessionToken, Session>>,
  offline:  AtomicBool,
  /// Logical clock so `created_at` strictly increases between writes.
  tick:     AtomicI64,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make every call fail with `StoreUnavailable` until switched back.
  pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

  /// Insert a library entry without going through the duplicate check, as a
  /// concurrent writer would.
  pub fn force_entry(&self, user_id: &UserId, book_id: &BookId) {
    let entry = LibraryEntry {
      entry_id:       EntryId::generate(),
      user_id:        user_id.clone(),
      book_id:        book_id.clone(),
      book_title:     book_id.to_string(),
      authors:        Vec::new(),
      image_links:    Default::default(),
      description:    String::new(),
      categories:     Vec::new(),
      publisher:      String::new(),
      published_date: String::new(),
      added_at:       self.now(),
    };
    self.entries.write().unwrap().push(entry);
  }

  fn check(&self) -> Result<()> {
    if self.offline.load(Ordering::SeqCst) {
      return Err(Error::unavailable(std::io::Error::other("memory store offline")));
    }
    Ok(())
  }

  fn now(&self) -> DateTime<Utc> {
    let n = self.tick.fetch_add(1, Ordering::SeqCst);
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(n)
  }

  fn open_session(&self, user_id: UserId, email: String) -> Session {
    let session = Session { user_id, email, token: SessionToken::generate() };
    self
      .sessions
      .write()
      .unwrap()
      .insert(session.token.clone(), session.clone());
    session
  }
}

impl ShelfStore for MemoryStore {
  type Error = Error;

  async fn put_profile(&self, profile: UserProfile) -> Result<()> {
    self.check()?;
    self.profiles.write().unwrap().insert(profile.user_id.clone(), profile);
    Ok(())
  }

  async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
    self.check()?;
    Ok(self.profiles.read().unwrap().get(&user_id).cloned())
  }

  async fn insert_entry(&self, entry: NewLibraryEntry) -> Result<LibraryEntry> {
    self.check()?;
    let mut entries = self.entries.write().unwrap();
    if entries
      .iter()
      .any(|e| e.user_id == entry.user_id && e.book_id == entry.book_id)
    {
      return Err(Error::AlreadyMember(entry.book_id));
    }
    let stored = LibraryEntry {
      entry_id:       EntryId::generate(),
      user_id:        entry.user_id,
      book_id:        entry.book_id,
      book_title:     entry.book_title,
      authors:        entry.authors,
      image_links:    entry.image_links,
      description:    entry.description,
      categories:     entry.categories,
      publisher:      entry.publisher,
      published_date: entry.published_date,
      added_at:       self.now(),
    };
    entries.push(stored.clone());
    Ok(stored)
  }

  async fn find_entries(
    &self,
    user_id: UserId,
    book_id: Option<BookId>,
  ) -> Result<Vec<LibraryEntry>> {
    self.check()?;
    Ok(
      self
        .entries
        .read()
        .unwrap()
        .iter()
        .filter(|e| e.user_id == user_id)
        .filter(|e| book_id.as_ref().is_none_or(|b| &e.book_id == b))
        .cloned()
        .collect(),
    )
  }

  async fn delete_entry(&self, owner: UserId, entry_id: EntryId) -> Result<bool> {
    self.check()?;
    let mut entries = self.entries.write().unwrap();
    let before = entries.len();
    entries.retain(|e| !(e.entry_id == entry_id && e.user_id == owner));
    Ok(entries.len() != before)
  }

  async fn insert_review(&self, review: NewReview) -> Result<Review> {
    self.check()?;
    let stored = Review {
      review_id:  ReviewId::generate(),
      book_id:    review.book_id,
      book_title: review.book_title,
      user_id:    review.user_id,
      comment:    review.comment,
      rating:     review.rating,
      created_at: self.now(),
      updated_at: None,
      deleted_at: None,
    };
    self.reviews.write().unwrap().push(stored.clone());
    Ok(stored)
  }

  async fn get_review(&self, review_id: ReviewId) -> Result<Option<Review>> {
    self.check()?;
    Ok(
      self
        .reviews
        .read()
        .unwrap()
        .iter()
        .find(|r| r.review_id == review_id)
        .cloned(),
    )
  }

  async fn find_reviews(&self, query: ReviewQuery) -> Result<Vec<Review>> {
    self.check()?;
    let mut found: Vec<Review> = self
      .reviews
      .read()
      .unwrap()
      .iter()
      .filter(|r| match &query.filter {
        ReviewFilter::Book(b) => &r.book_id == b,
        ReviewFilter::Author(u) => &r.user_id == u,
      })
      .filter(|r| r.deleted_at.is_none())
      .cloned()
      .collect();
    if query.order == ReviewOrder::NewestFirst {
      found.reverse();
    }
    Ok(found)
  }

  async fn update_review(
    &self,
    requester: UserId,
    review_id: ReviewId,
    patch: ReviewPatch,
  ) -> Result<Review> {
    self.check()?;
    let now = self.now();
    let mut reviews = self.reviews.write().unwrap();
    let review = reviews
      .iter_mut()
      .find(|r| r.review_id == review_id)
      .ok_or_else(|| Error::NotFound(format!("review {review_id}")))?;
    if review.user_id != requester {
      return Err(Error::Forbidden);
    }
    review.state().advance(ReviewEvent::Edit)?;
    review.comment = patch.comment;
    review.rating = patch.rating;
    review.updated_at = Some(now);
    Ok(review.clone())
  }

  async fn delete_review(&self, requester: UserId, review_id: ReviewId) -> Result<bool> {
    self.check()?;
    let now = self.now();
    let mut reviews = self.reviews.write().unwrap();
    let Some(review) = reviews.iter_mut().find(|r| r.review_id == review_id) else {
      return Ok(false);
    };
    if review.user_id != requester {
      return Err(Error::Forbidden);
    }
    if review.state().is_terminal() {
      return Ok(false);
    }
    review.deleted_at = Some(now);
    Ok(true)
  }
}

impl IdentityProvider for MemoryStore {
  type Error = Error;

  async fn sign_up(&self, email: String, password: String) -> Result<Session> {
    self.check()?;
    let user_id = {
      let mut accounts = self.accounts.write().unwrap();
      if accounts.contains_key(&email) {
        return Err(AuthError::EmailAlreadyInUse.into());
      }
      let user_id = UserId::generate();
      accounts.insert(email.clone(), (user_id.clone(), password));
      user_id
    };
    Ok(self.open_session(user_id, email))
  }

  async fn sign_in(&self, email: String, password: String) -> Result<Session> {
    self.check()?;
    let user_id = match self.accounts.read().unwrap().get(&email) {
      Some((id, stored)) if *stored == password => id.clone(),
      _ => return Err(AuthError::InvalidCredentials.into()),
    };
    Ok(self.open_session(user_id, email))
  }

  async fn sign_out(&self, token: SessionToken) -> Result<()> {
    self.check()?;
    self.sessions.write().unwrap().remove(&token);
    Ok(())
  }

  async fn current_session(&self, token: SessionToken) -> Result<Option<Session>> {
    self.check()?;
    Ok(self.sessions.read().unwrap().get(&token).cloned())
  }
}
