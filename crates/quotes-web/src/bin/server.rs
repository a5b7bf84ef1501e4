//! quotes-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `QUOTES_*`
//! environment overrides, opens the SQLite quote database, and serves the
//! HTML listing until Ctrl-C.
//!
//! ```toml
//! host     = "0.0.0.0"
//! port     = 8080
//! db_path  = "~/quotes.db"
//! web_auth = "admin:hunter2"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use quotes_store_sqlite::QuoteDb;
use quotes_web::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Quote database web listing")]
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
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QUOTES"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let db_path = expand_tilde(&server_cfg.db_path);

  let db = QuoteDb::open(&db_path, server_cfg.web_auth.as_deref())
    .await
    .with_context(|| format!("failed to open quote database at {db_path:?}"))?;

  if db.credentials().is_none() {
    tracing::warn!("web_auth not set; listing is public");
  }

  let state = AppState {
    credentials: db.credentials().cloned().map(Arc::new),
    store:       Arc::new(db.clone()),
  };

  let app = quotes_web::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("shutting down");
  db.close().await.context("failed to close quote database")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
  }
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
