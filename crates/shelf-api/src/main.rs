//! shelf-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SHELF_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! ```toml
//! host          = "127.0.0.1"
//! port          = 8080
//! store_path    = "~/.local/share/shelf/shelf.db"
//! catalog_url   = "https://reactnd-books-api.udacity.com"
//! catalog_token = "your-catalog-token"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use shelf_api::{AppState, ServerConfig};
use shelf_catalog::{CatalogConfig, HttpCatalog};
use shelf_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Shelf JSON API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "shelf.db")?
    .set_default("catalog_url", "https://reactnd-books-api.udacity.com")?
    .set_default("catalog_token", "")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SHELF"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if server_cfg.catalog_token.is_empty() {
    tracing::warn!("catalog_token is empty; the catalog may reject requests");
  }
  let catalog = HttpCatalog::new(CatalogConfig::new(
    server_cfg.catalog_url.clone(),
    server_cfg.catalog_token.clone(),
  ))
  .context("failed to build catalog client")?;

  let state = AppState::new(Arc::new(store), Arc::new(catalog));
  let app = shelf_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
