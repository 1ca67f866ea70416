//! Service-level tests for the library, review and account flows against the
//! in-memory store.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::{
  Error, ValidationError,
  account::{self, RegistrationForm},
  book::CatalogBook,
  id::{BookId, ReviewId},
  identity::{AuthError, IdentityProvider, Session},
  library::{self, LibraryTracker},
  memory::MemoryStore,
  review::{ReviewDraft, ReviewEvent, ReviewManager, ReviewPatch, ReviewState},
  store::ShelfStore,
  tracked::{BookReviewsView, LibraryView, RefreshOutcome, Tracked},
};

fn setup() -> (Arc<MemoryStore>, LibraryTracker<MemoryStore>, ReviewManager<MemoryStore>) {
  let store = Arc::new(MemoryStore::new());
  (store.clone(), LibraryTracker::new(store.clone()), ReviewManager::new(store))
}

async fn session(store: &MemoryStore, email: &str) -> Session {
  store.sign_up(email.into(), "Secret#123".into()).await.unwrap()
}

fn book(id: &str) -> CatalogBook {
  let mut b = CatalogBook::new(id, format!("Book {id}"));
  b.authors = vec!["Someone".into()];
  b
}

fn draft(book_id: &str, comment: &str, rating: u8) -> ReviewDraft {
  ReviewDraft {
    book_id:    BookId::from(book_id),
    book_title: format!("Book {book_id}"),
    comment:    comment.into(),
    rating,
  }
}

// ─── Library ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_makes_book_a_member() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;

  let entry = lib.add(Some(&u1), &book("b1")).await.unwrap();
  assert_eq!(entry.book_title, "Book b1");
  assert_eq!(entry.authors, ["Someone"]);
  assert!(lib.is_member(&u1.user_id, &BookId::from("b1")).await.unwrap());
  assert!(!lib.is_member(&u1.user_id, &BookId::from("b2")).await.unwrap());
}

#[tokio::test]
async fn membership_follows_add_then_remove() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let b1 = BookId::from("b1");

  assert!(!lib.is_member(&u1.user_id, &b1).await.unwrap());
  let entry = lib.add(Some(&u1), &book("b1")).await.unwrap();
  assert!(lib.is_member(&u1.user_id, &b1).await.unwrap());
  assert!(lib.remove(Some(&u1), &entry.entry_id).await.unwrap());
  assert!(!lib.is_member(&u1.user_id, &b1).await.unwrap());
}

#[tokio::test]
async fn second_add_is_already_member() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;

  lib.add(Some(&u1), &book("b1")).await.unwrap();
  let err = lib.add(Some(&u1), &book("b1")).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyMember(ref id) if id.as_str() == "b1"));
  assert_eq!(lib.list(Some(&u1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn membership_is_per_user() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let u2 = session(&store, "u2@example.com").await;

  lib.add(Some(&u1), &book("b1")).await.unwrap();
  lib.add(Some(&u2), &book("b1")).await.unwrap();
  assert_eq!(lib.list(Some(&u1)).await.unwrap().len(), 1);
  assert_eq!(lib.list(Some(&u2)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn store_rejects_duplicate_insert() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  store.force_entry(&u1.user_id, &BookId::from("b1"));

  let err = lib.add(Some(&u1), &book("b1")).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyMember(_)));

  let direct = store
    .insert_entry(library::NewLibraryEntry::from_book(u1.user_id.clone(), &book("b1")))
    .await
    .unwrap_err();
  assert!(matches!(direct, Error::AlreadyMember(_)));
}

#[tokio::test]
async fn remove_clears_membership_and_is_idempotent() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let entry = lib.add(Some(&u1), &book("b1")).await.unwrap();

  assert!(lib.remove(Some(&u1), &entry.entry_id).await.unwrap());
  assert!(!lib.is_member(&u1.user_id, &BookId::from("b1")).await.unwrap());
  assert!(!lib.remove(Some(&u1), &entry.entry_id).await.unwrap());
}

#[tokio::test]
async fn cannot_remove_someone_elses_entry() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let u2 = session(&store, "u2@example.com").await;
  let entry = lib.add(Some(&u1), &book("b1")).await.unwrap();

  assert!(!lib.remove(Some(&u2), &entry.entry_id).await.unwrap());
  assert!(lib.is_member(&u1.user_id, &BookId::from("b1")).await.unwrap());
}

#[tokio::test]
async fn library_writes_need_a_session() {
  let (_, lib, _) = setup();
  assert!(matches!(lib.add(None, &book("b1")).await, Err(Error::Unauthenticated)));
  assert!(matches!(lib.list(None).await, Err(Error::Unauthenticated)));
}

#[tokio::test]
async fn catalog_page_is_annotated_from_one_membership_read() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  lib.add(Some(&u1), &book("b2")).await.unwrap();

  let members = lib.membership(&u1.user_id).await.unwrap();
  let listing = library::annotate(vec![book("b1"), book("b2"), book("b3")], &members);
  let flags: Vec<_> = listing.iter().map(|l| l.in_library).collect();
  assert_eq!(flags, [false, true, false]);
}

#[tokio::test]
async fn store_outage_is_retryable() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  store.set_offline(true);

  let err = lib.add(Some(&u1), &book("b1")).await.unwrap_err();
  assert!(matches!(err, Error::StoreUnavailable(_)));
  assert!(err.is_retryable());

  store.set_offline(false);
  lib.add(Some(&u1), &book("b1")).await.unwrap();
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_then_average_is_exact() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;

  let review = reviews.submit(Some(&u1), draft("b1", "Loved it", 5)).await.unwrap();
  assert_eq!(review.user_id, u1.user_id);
  assert_eq!(review.state(), ReviewState::Persisted);

  let view = BookReviewsView::new(reviews.clone(), BookId::from("b1"), Some(u1.clone()));
  assert_eq!(view.refresh().await.unwrap(), RefreshOutcome::Applied);
  let summary = view.summary();
  assert_eq!(summary.count, 1);
  assert_eq!(summary.average, 5.0);
  assert_eq!(summary.stars, 5);
}

#[tokio::test]
async fn invalid_drafts_write_nothing() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;

  let err = reviews.submit(Some(&u1), draft("b1", "   ", 4)).await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::EmptyComment)));

  let err = reviews.submit(Some(&u1), draft("b1", "Fine", 0)).await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::NoRating)));

  assert!(reviews.for_book(&BookId::from("b1")).await.unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_submit_is_rejected() {
  let (_, _, reviews) = setup();
  let err = reviews.submit(None, draft("b1", "Hi", 3)).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
}

#[tokio::test]
async fn only_the_author_may_edit_or_delete() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let u2 = session(&store, "u2@example.com").await;
  let review = reviews.submit(Some(&u1), draft("b1", "Mine", 4)).await.unwrap();

  let err = reviews
    .update(Some(&u2), &review.review_id, "Hijacked", 1)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden));

  let err = reviews.delete(Some(&u2), &review.review_id).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden));

  let stored = store.get_review(review.review_id.clone()).await.unwrap().unwrap();
  assert_eq!(stored.comment.as_str(), "Mine");
}

#[tokio::test]
async fn edit_replaces_fields_and_stamps_update_time() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let review = reviews.submit(Some(&u1), draft("b1", "Good", 4)).await.unwrap();

  let edited = reviews
    .update(Some(&u1), &review.review_id, "  Even better  ", 5)
    .await
    .unwrap();
  assert_eq!(edited.comment.as_str(), "Even better");
  assert_eq!(edited.rating.get(), 5);
  assert_eq!(edited.created_at, review.created_at);
  assert!(edited.updated_at.is_some());
  assert_eq!(edited.state(), ReviewState::Edited);
}

#[tokio::test]
async fn invalid_edit_leaves_review_untouched() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let review = reviews.submit(Some(&u1), draft("b1", "Good", 4)).await.unwrap();

  let err = reviews.update(Some(&u1), &review.review_id, "Ok", 9).await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::RatingOutOfRange(9))));

  let stored = store.get_review(review.review_id.clone()).await.unwrap().unwrap();
  assert_eq!(stored, review);
}

#[tokio::test]
async fn editing_a_missing_review_is_not_found() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let err = reviews
    .update(Some(&u1), &ReviewId::from("gone"), "Text", 3)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn delete_removes_from_book_listing() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let review = reviews.submit(Some(&u1), draft("b1", "Meh", 2)).await.unwrap();

  assert!(reviews.delete(Some(&u1), &review.review_id).await.unwrap());
  assert!(reviews.for_book(&BookId::from("b1")).await.unwrap().is_empty());
  assert!(!reviews.delete(Some(&u1), &review.review_id).await.unwrap());
}

#[tokio::test]
async fn deleted_review_cannot_be_edited() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let review = reviews.submit(Some(&u1), draft("b1", "Short-lived", 3)).await.unwrap();
  assert!(reviews.delete(Some(&u1), &review.review_id).await.unwrap());

  let err = reviews
    .update(Some(&u1), &review.review_id, "Back again", 4)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { from: ReviewState::Deleted, event: ReviewEvent::Edit }
  ));

  let tombstone = store.get_review(review.review_id.clone()).await.unwrap().unwrap();
  assert_eq!(tombstone.state(), ReviewState::Deleted);
  assert_eq!(tombstone.comment.as_str(), "Short-lived");

  // A writer that skipped the manager's check is refused by the store too.
  let err = store
    .update_review(u1.user_id.clone(), review.review_id, ReviewPatch::new("x", 1).unwrap())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { from: ReviewState::Deleted, .. }));
}

#[tokio::test]
async fn book_reviews_are_newest_first_and_user_reviews_best_first() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let u2 = session(&store, "u2@example.com").await;
  reviews.submit(Some(&u1), draft("b1", "first", 3)).await.unwrap();
  reviews.submit(Some(&u2), draft("b1", "second", 5)).await.unwrap();
  reviews.submit(Some(&u1), draft("b2", "other", 5)).await.unwrap();

  let for_book = reviews.for_book(&BookId::from("b1")).await.unwrap();
  let comments: Vec<_> = for_book.iter().map(|r| r.comment.as_str()).collect();
  assert_eq!(comments, ["second", "first"]);

  let mine = reviews.for_user(&u1.user_id).await.unwrap();
  let ratings: Vec<_> = mine.iter().map(|r| r.rating.get()).collect();
  assert_eq!(ratings, [5, 3]);
}

#[tokio::test]
async fn viewer_may_edit_only_own_reviews() {
  let (store, _, reviews) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let u2 = session(&store, "u2@example.com").await;
  reviews.submit(Some(&u1), draft("b1", "one", 4)).await.unwrap();
  reviews.submit(Some(&u2), draft("b1", "two", 5)).await.unwrap();

  let view = BookReviewsView::new(reviews.clone(), BookId::from("b1"), Some(u1.clone()));
  view.refresh().await.unwrap();
  let editable: Vec<_> = view.reviews().iter().map(|r| view.can_edit(r)).collect();
  assert_eq!(editable, [false, true]);
  assert_eq!(view.summary().average, 4.5);

  let anonymous = BookReviewsView::new(reviews, BookId::from("b1"), None);
  anonymous.refresh().await.unwrap();
  assert!(anonymous.reviews().iter().all(|r| !anonymous.can_edit(r)));
}

// ─── Tracked snapshots ───────────────────────────────────────────────────────

#[tokio::test]
async fn library_view_reflects_store_after_refresh() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  let view = LibraryView::new(lib.clone(), u1.clone());
  assert!(view.entries().is_empty());

  lib.add(Some(&u1), &book("b1")).await.unwrap();
  assert!(view.entries().is_empty());

  assert_eq!(view.refresh().await.unwrap(), RefreshOutcome::Applied);
  assert_eq!(view.entries().len(), 1);
  assert!(view.membership().contains(&BookId::from("b1")));
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
  let (store, lib, _) = setup();
  let u1 = session(&store, "u1@example.com").await;
  lib.add(Some(&u1), &book("b1")).await.unwrap();
  let view = LibraryView::new(lib, u1);
  view.refresh().await.unwrap();

  store.set_offline(true);
  assert!(view.refresh().await.is_err());
  assert_eq!(view.entries().len(), 1);
}

#[tokio::test]
async fn stale_refresh_is_discarded() {
  let tracked = Tracked::new(0u32);
  let (tx, rx) = oneshot::channel::<u32>();

  let slow = tracked.refresh(async { Ok(rx.await.unwrap()) });
  let fast = async {
    let outcome = tracked.refresh(async { Ok(2) }).await;
    tx.send(1).unwrap();
    outcome
  };
  let (slow, fast) = tokio::join!(slow, fast);

  assert_eq!(fast.unwrap(), RefreshOutcome::Applied);
  assert_eq!(slow.unwrap(), RefreshOutcome::Discarded);
  assert_eq!(tracked.snapshot(), 2);
}

#[tokio::test]
async fn detached_view_drops_in_flight_result() {
  let tracked = Tracked::new(vec![1u32]);
  let (tx, rx) = oneshot::channel::<Vec<u32>>();

  let pending = tracked.refresh(async { Ok(rx.await.unwrap()) });
  let detach = async {
    tracked.detach();
    tx.send(vec![9, 9]).unwrap();
  };
  let (outcome, ()) = tokio::join!(pending, detach);

  assert_eq!(outcome.unwrap(), RefreshOutcome::Discarded);
  assert_eq!(tracked.snapshot(), [1]);
  assert!(!tracked.is_attached());

  tracked.attach();
  assert_eq!(tracked.refresh(async { Ok(vec![3]) }).await.unwrap(), RefreshOutcome::Applied);
  assert_eq!(tracked.snapshot(), [3]);
}

// ─── Accounts ────────────────────────────────────────────────────────────────

fn form(email: &str) -> RegistrationForm {
  RegistrationForm {
    first_name:       "Grace".into(),
    last_name:        "Hopper".into(),
    email:            email.into(),
    password:         "Cobol#1959".into(),
    confirm_password: "Cobol#1959".into(),
  }
}

#[tokio::test]
async fn register_writes_profile_and_signs_in() {
  let store = MemoryStore::new();
  let session = account::register(&store, &store, form(" grace@example.com "))
    .await
    .unwrap();
  assert_eq!(session.email, "grace@example.com");

  let profile = store.get_profile(session.user_id.clone()).await.unwrap().unwrap();
  assert_eq!(profile.first_name, "Grace");
  assert_eq!(profile.email, "grace@example.com");

  let again = account::sign_in(&store, "grace@example.com", "Cobol#1959").await.unwrap();
  assert_eq!(again.user_id, session.user_id);
}

#[tokio::test]
async fn registration_email_is_normalized_once() {
  let store = MemoryStore::new();
  let session = account::register(&store, &store, form("Grace@Example.COM"))
    .await
    .unwrap();
  let profile = store.get_profile(session.user_id.clone()).await.unwrap().unwrap();
  assert_eq!(session.email, "grace@example.com");
  assert_eq!(profile.email, session.email);

  let again = account::sign_in(&store, " GRACE@example.com", "Cobol#1959").await.unwrap();
  assert_eq!(again.user_id, session.user_id);
}

#[tokio::test]
async fn duplicate_registration_fails() {
  let store = MemoryStore::new();
  account::register(&store, &store, form("grace@example.com")).await.unwrap();
  let err = account::register(&store, &store, form("grace@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Auth(AuthError::EmailAlreadyInUse)));
}

#[tokio::test]
async fn invalid_form_never_reaches_provider() {
  let store = MemoryStore::new();
  let mut f = form("grace@example.com");
  f.confirm_password = "different".into();
  let err = account::register(&store, &store, f).await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::PasswordMismatch)));

  let err = account::sign_in(&store, "grace@example.com", "Cobol#1959").await.unwrap_err();
  assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn sign_in_checks_form_then_credentials() {
  let store = MemoryStore::new();
  account::register(&store, &store, form("grace@example.com")).await.unwrap();

  let err = account::sign_in(&store, "not-an-email", "x").await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::MalformedEmail)));

  let err = account::sign_in(&store, "grace@example.com", "").await.unwrap_err();
  assert!(matches!(err, Error::Validation(ValidationError::MissingPassword)));

  let err = account::sign_in(&store, "grace@example.com", "Wrong#000").await.unwrap_err();
  assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn signed_out_token_no_longer_resolves() {
  let store = MemoryStore::new();
  let session = account::register(&store, &store, form("grace@example.com")).await.unwrap();
  assert!(store.current_session(session.token.clone()).await.unwrap().is_some());

  store.sign_out(session.token.clone()).await.unwrap();
  assert!(store.current_session(session.token).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_summary_counts_library_and_reviews() {
  let store = Arc::new(MemoryStore::new());
  let lib = LibraryTracker::new(store.clone());
  let reviews = ReviewManager::new(store.clone());
  let session = account::register(store.as_ref(), store.as_ref(), form("grace@example.com"))
    .await
    .unwrap();

  lib.add(Some(&session), &book("b1")).await.unwrap();
  lib.add(Some(&session), &book("b2")).await.unwrap();
  reviews.submit(Some(&session), draft("b1", "ok", 3)).await.unwrap();
  reviews.submit(Some(&session), draft("b2", "great", 4)).await.unwrap();

  let summary = account::profile_summary(store.as_ref(), Some(&session)).await.unwrap();
  assert_eq!(summary.profile.map(|p| p.last_name), Some("Hopper".to_owned()));
  assert_eq!(summary.library_count, 2);
  let titles: Vec<_> = summary.library.iter().map(|e| e.book_title.as_str()).collect();
  assert_eq!(titles, ["Book b1", "Book b2"]);
  let ratings: Vec<_> = summary.reviews.iter().map(|r| r.rating.get()).collect();
  assert_eq!(ratings, [4, 3]);
  assert_eq!(summary.rating.average, 3.5);
  assert_eq!(summary.rating.stars, 4);

  assert!(matches!(
    account::profile_summary(store.as_ref(), None).await,
    Err(Error::Unauthenticated)
  ));
}

#[tokio::test]
async fn profile_summary_without_profile_document() {
  let store = MemoryStore::new();
  let session = store.sign_up("bare@example.com".into(), "Secret#123".into()).await.unwrap();
  let summary = account::profile_summary(&store, Some(&session)).await.unwrap();
  assert!(summary.profile.is_none());
  assert_eq!(summary.rating.count, 0);
  assert_eq!(summary.rating.average, 0.0);
}
