//! `shelf` — command-line client for the Shelf API.
//!
//! # Usage
//!
//! ```
//! shelf --url http://localhost:8080 login reader@example.com
//! export SHELF_TOKEN=<token printed above>
//! shelf catalog
//! shelf library add <book-id>
//! shelf review submit <book-id> --rating 4 --comment "Loved it"
//! ```

mod client;
mod render;

use std::{io::BufRead as _, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use shelf_core::{
  account::RegistrationForm,
  id::{BookId, EntryId, ReviewId},
  review::ReviewDraft,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "shelf", about = "Command-line client for the Shelf book catalog")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the shelf server (default: http://localhost:8080).
  #[arg(long, env = "SHELF_URL")]
  url: Option<String>,

  /// Session token from `shelf login`.
  #[arg(long, env = "SHELF_TOKEN")]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account and print its session token.
  Register {
    first_name: String,
    last_name:  String,
    email:      String,
    /// Read from stdin when omitted.
    #[arg(long)]
    password:   Option<String>,
  },
  /// Sign in and print a session token.
  Login {
    email:    String,
    /// Read from stdin when omitted.
    #[arg(long)]
    password: Option<String>,
  },
  /// End the current session.
  Logout,
  /// List the catalog; books in your library are marked with `*`.
  Catalog,
  /// Manage your library.
  Library {
    #[command(subcommand)]
    action: LibraryAction,
  },
  /// Show the rating summary and reviews of a book.
  Reviews { book_id: String },
  /// Write, edit or delete your reviews.
  Review {
    #[command(subcommand)]
    action: ReviewAction,
  },
  /// Show your profile, library size and reviews.
  Profile,
}

#[derive(Subcommand, Debug)]
enum LibraryAction {
  List,
  Add { book_id: String },
  Remove { entry_id: String },
}

#[derive(Subcommand, Debug)]
enum ReviewAction {
  Submit {
    book_id: String,
    #[arg(long)]
    rating:  u8,
    #[arg(long)]
    comment: String,
  },
  Edit {
    review_id: String,
    #[arg(long)]
    rating:    u8,
    #[arg(long)]
    comment:   String,
  },
  Delete { review_id: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token:    args
      .token
      .or_else(|| (!file_cfg.token.is_empty()).then(|| file_cfg.token.clone())),
  };
  tracing::debug!(url = %api_config.base_url, signed_in = api_config.token.is_some(), "client configured");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Register { first_name, last_name, email, password } => {
      let password = password_or_stdin(password)?;
      let form = RegistrationForm {
        first_name,
        last_name,
        email,
        confirm_password: password.clone(),
        password,
      };
      let session = client.register(&form).await?;
      println!("{}", session.token);
    }
    Command::Login { email, password } => {
      let password = password_or_stdin(password)?;
      let session = client.login(&email, &password).await?;
      println!("{}", session.token);
    }
    Command::Logout => client.logout().await?,
    Command::Catalog => print!("{}", render::catalog(&client.catalog().await?)),
    Command::Library { action } => match action {
      LibraryAction::List => print!("{}", render::library(&client.library().await?)),
      LibraryAction::Add { book_id } => {
        let book = client.find_book(&BookId::from(book_id)).await?;
        let entry = client.add_to_library(&book).await?;
        println!("added {} ({})", entry.book_title, entry.entry_id);
      }
      LibraryAction::Remove { entry_id } => {
        client.remove_from_library(&EntryId::from(entry_id)).await?;
      }
    },
    Command::Reviews { book_id } => {
      let page = client.book_reviews(&BookId::from(book_id)).await?;
      print!("{}", render::book_reviews(&page));
    }
    Command::Review { action } => match action {
      ReviewAction::Submit { book_id, rating, comment } => {
        let book = client.find_book(&BookId::from(book_id)).await?;
        let draft = ReviewDraft { book_id: book.id, book_title: book.title, comment, rating };
        let review = client.submit_review(&draft).await?;
        println!("{}", review.review_id);
      }
      ReviewAction::Edit { review_id, rating, comment } => {
        client
          .edit_review(&ReviewId::from(review_id), &comment, rating)
          .await?;
      }
      ReviewAction::Delete { review_id } => {
        client.delete_review(&ReviewId::from(review_id)).await?;
      }
    },
    Command::Profile => print!("{}", render::profile(&client.profile().await?)),
  }
  Ok(())
}

/// Use the flag if given, otherwise read one line from stdin.
fn password_or_stdin(flag: Option<String>) -> Result<String> {
  if let Some(password) = flag {
    return Ok(password);
  }
  let mut line = String::new();
  std::io::stdin()
    .lock()
    .read_line(&mut line)
    .context("reading password from stdin")?;
  let password = line.trim_end_matches(['\r', '\n']).to_owned();
  if password.is_empty() {
    bail!("no password given (pass --password or pipe it on stdin)");
  }
  Ok(password)
}
