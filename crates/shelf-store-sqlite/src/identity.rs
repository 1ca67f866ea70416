//! [`IdentityProvider`] for [`SqliteStore`]: argon2-hashed accounts and
//! random bearer-token sessions.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};

use shelf_core::{
  account::{looks_like_email, normalize_email},
  id::{SessionToken, UserId},
  identity::{AuthError, IdentityProvider, Session},
};

use crate::{
  Error, Result,
  encode::encode_dt,
  store::{SqliteStore, is_unique_violation},
};

/// The provider's own floor; the registration form asks for more.
const MIN_PASSWORD_LEN: usize = 6;

fn auth(e: AuthError) -> Error { Error::Core(e.into()) }

/// Runs on the blocking pool, as does [`verify_password`].
async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::Hash(e.to_string()))
  })
  .await?
}

async fn verify_password(password: String, phc: String) -> Result<bool> {
  let ok = tokio::task::spawn_blocking(move || {
    PasswordHash::new(&phc)
      .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
      .is_ok()
  })
  .await?;
  Ok(ok)
}

impl SqliteStore {
  async fn open_session(&self, user_id: UserId, email: String) -> Result<Session> {
    let session = Session { user_id, email, token: SessionToken::generate() };

    let token_str = session.token.to_string();
    let user_str  = session.user_id.to_string();
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_str, user_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(session)
  }
}

impl IdentityProvider for SqliteStore {
  type Error = Error;

  async fn sign_up(&self, email: String, password: String) -> Result<Session> {
    let email = normalize_email(&email);
    if !looks_like_email(&email) {
      return Err(auth(AuthError::InvalidEmail));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(auth(AuthError::WeakPassword));
    }

    let hash     = hash_password(password).await?;
    let user_id  = UserId::generate();
    let user_str = user_id.to_string();
    let email_c  = email.clone();
    let at_str   = encode_dt(Utc::now());

    let created = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO accounts (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_str, email_c, hash, at_str],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !created {
      debug!(%email, "sign-up for existing email");
      return Err(auth(AuthError::EmailAlreadyInUse));
    }

    info!(%user_id, "account created");
    self.open_session(user_id, email).await
  }

  async fn sign_in(&self, email: String, password: String) -> Result<Session> {
    let email   = normalize_email(&email);
    let email_c = email.clone();

    let account: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, password_hash FROM accounts WHERE email = ?1",
            rusqlite::params![email_c],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    let Some((user_id, phc)) = account else {
      debug!(%email, "sign-in for unknown email");
      return Err(auth(AuthError::InvalidCredentials));
    };
    if !verify_password(password, phc).await? {
      debug!(%email, "sign-in with wrong password");
      return Err(auth(AuthError::InvalidCredentials));
    }

    self.open_session(UserId::from(user_id), email).await
  }

  async fn sign_out(&self, token: SessionToken) -> Result<()> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token = ?1",
          rusqlite::params![token.as_str()],
        )?)
      })
      .await?;
    debug!(removed, "session closed");
    Ok(())
  }

  async fn current_session(&self, token: SessionToken) -> Result<Option<Session>> {
    let row: Option<(String, String)> = self
      .conn
      .call({
        let token = token.clone();
        move |conn| {
          Ok(conn
            .query_row(
              "SELECT s.user_id, a.email
               FROM sessions s
               JOIN accounts a ON a.user_id = s.user_id
               WHERE s.token = ?1",
              rusqlite::params![token.as_str()],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?)
        }
      })
      .await?;

    Ok(row.map(|(user_id, email)| Session { user_id: UserId::from(user_id), email, token }))
  }
}
