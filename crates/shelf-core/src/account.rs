//! User profiles, registration rules, and the per-user profile summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  Result, ValidationError,
  aggregate::{self, RatingSummary},
  error::from_backend,
  id::UserId,
  identity::{IdentityProvider, Session, require},
  library::LibraryEntry,
  review::Review,
  store::{ReviewQuery, ShelfStore},
};

/// The `users` document written once at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id:    UserId,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub created_at: DateTime<Utc>,
}

// ─── Form checks ─────────────────────────────────────────────────────────────

const PASSWORD_SYMBOLS: &str = "!@#$%^&*";
const PASSWORD_MIN_LEN: usize = 8;

/// Loose shape check: something, `@`, something, `.`, something, with no
/// whitespace inside each part.
pub fn looks_like_email(input: &str) -> bool {
  input.char_indices().filter(|&(_, c)| c == '@').any(|(at, _)| {
    let local_ok = input[..at].chars().next_back().is_some_and(|c| !c.is_whitespace());
    let domain: Vec<char> = input[at + 1..].chars().take_while(|c| !c.is_whitespace()).collect();
    // A dot with at least one character on each side.
    local_ok
      && domain.len() >= 3
      && domain[1..domain.len() - 1].contains(&'.')
  })
}

/// The form of an email address that accounts are keyed by.
pub fn normalize_email(input: &str) -> String { input.trim().to_lowercase() }

/// At least eight characters with a lowercase letter, an uppercase letter, a
/// digit and one of `!@#$%^&*`.
pub fn is_strong_password(password: &str) -> bool {
  password.chars().count() >= PASSWORD_MIN_LEN
    && password.chars().any(|c| c.is_ascii_lowercase())
    && password.chars().any(|c| c.is_ascii_uppercase())
    && password.chars().any(|c| c.is_ascii_digit())
    && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// Sign-up form input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
  pub first_name:       String,
  pub last_name:        String,
  pub email:            String,
  pub password:         String,
  pub confirm_password: String,
}

impl RegistrationForm {
  /// Check fields in form order and report the first problem.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
      return Err(ValidationError::MissingName);
    }
    let email = self.email.trim();
    if email.is_empty() {
      return Err(ValidationError::MissingEmail);
    }
    if !looks_like_email(email) {
      return Err(ValidationError::MalformedEmail);
    }
    if self.password.is_empty() {
      return Err(ValidationError::MissingPassword);
    }
    if !is_strong_password(&self.password) {
      return Err(ValidationError::WeakPassword);
    }
    if self.password != self.confirm_password {
      return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
  }
}

// ─── Flows ───────────────────────────────────────────────────────────────────

/// Validate `form`, create the account, and write its profile document.
///
/// The account and the profile are two separate writes; if the second fails
/// the account exists without a profile and [`profile_summary`] reports
/// `profile: None`.
pub async fn register<I, S>(identity: &I, store: &S, form: RegistrationForm) -> Result<Session>
where
  I: IdentityProvider,
  S: ShelfStore,
{
  form.validate()?;
  let email = normalize_email(&form.email);

  let session = identity
    .sign_up(email.clone(), form.password)
    .await
    .map_err(from_backend)?;

  store
    .put_profile(UserProfile {
      user_id: session.user_id.clone(),
      email,
      first_name: form.first_name.trim().to_owned(),
      last_name: form.last_name.trim().to_owned(),
      created_at: Utc::now(),
    })
    .await
    .map_err(from_backend)?;

  info!(user_id = %session.user_id, "registered new user");
  Ok(session)
}

/// Check the login form locally, then ask the provider.
pub async fn sign_in<I: IdentityProvider>(identity: &I, email: &str, password: &str) -> Result<Session> {
  let email = normalize_email(email);
  if !looks_like_email(&email) {
    return Err(ValidationError::MalformedEmail.into());
  }
  if password.is_empty() {
    return Err(ValidationError::MissingPassword.into());
  }
  identity
    .sign_in(email, password.to_owned())
    .await
    .map_err(Into::into)
}

/// What the profile page shows about the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
  pub profile:       Option<UserProfile>,
  pub library_count: usize,
  /// The user's library, oldest-added first.
  #[serde(default)]
  pub library:       Vec<LibraryEntry>,
  /// The user's reviews, highest rating first.
  pub reviews:       Vec<Review>,
  pub rating:        RatingSummary,
}

pub async fn profile_summary<S: ShelfStore>(
  store: &S,
  session: Option<&Session>,
) -> Result<ProfileSummary> {
  let session = require(session)?;
  let user_id = &session.user_id;

  let profile = store.get_profile(user_id.clone()).await.map_err(from_backend)?;
  let entries = store
    .find_entries(user_id.clone(), None)
    .await
    .map_err(from_backend)?;
  let reviews = store
    .find_reviews(ReviewQuery::by_author(user_id.clone()))
    .await
    .map_err(from_backend)?;

  let reviews = aggregate::by_rating_desc(reviews);
  Ok(ProfileSummary {
    profile,
    library_count: entries.len(),
    library: entries,
    rating: aggregate::summarize(&reviews),
    reviews,
  })
}
