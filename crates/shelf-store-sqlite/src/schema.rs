//! SQL schema for the Shelf SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Profile documents, written once at registration.
CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    email       TEXT NOT NULL,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Credentials. Kept apart from `users` so a profile write can fail on its own.
CREATE TABLE IF NOT EXISTS accounts (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token       TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES accounts(user_id),
    created_at  TEXT NOT NULL
);

-- Library entries. Book fields are copied from the catalog at insert time.
CREATE TABLE IF NOT EXISTS user_books (
    entry_id        TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    book_id         TEXT NOT NULL,
    book_title      TEXT NOT NULL,
    authors         TEXT NOT NULL DEFAULT '[]',   -- JSON array
    thumbnail       TEXT,
    small_thumbnail TEXT,
    description     TEXT NOT NULL DEFAULT '',
    categories      TEXT NOT NULL DEFAULT '[]',   -- JSON array
    publisher       TEXT NOT NULL DEFAULT '',
    published_date  TEXT NOT NULL DEFAULT '',
    added_at        TEXT NOT NULL,
    UNIQUE (user_id, book_id)
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   TEXT PRIMARY KEY,
    book_id     TEXT NOT NULL,
    book_title  TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    comment     TEXT NOT NULL,
    rating      INTEGER NOT NULL,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at  TEXT,
    deleted_at  TEXT,            -- set on delete; the row stays as a tombstone
    CHECK (rating BETWEEN 1 AND 5),
    CHECK (length(trim(comment)) > 0)
);

CREATE INDEX IF NOT EXISTS user_books_user_idx ON user_books(user_id);
CREATE INDEX IF NOT EXISTS reviews_book_idx    ON reviews(book_id, created_at);
CREATE INDEX IF NOT EXISTS reviews_user_idx    ON reviews(user_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx   ON sessions(user_id);

PRAGMA user_version = 1;
";
