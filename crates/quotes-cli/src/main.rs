//! `quotes` — command-line access to the quote database.
//!
//! # Usage
//!
//! ```
//! quotes add "ada" "<ada> hello world"
//! quotes upvote 1 bob
//! quotes list --votesort
//! QUOTES_DB=~/quotes.db quotes --json random --all
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use quotes_store_sqlite::QuoteDb;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "quotes", version, about = "Quote database with per-voter voting")]
struct Args {
  /// Path to the SQLite quote database.
  #[arg(long, env = "QUOTES_DB", default_value = "quotes.db", global = true)]
  db: PathBuf,

  /// Print results as JSON instead of plain text.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr so stdout stays parseable.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let db = QuoteDb::open(&args.db, None)
    .await
    .with_context(|| format!("opening quote database {}", args.db.display()))?;

  let result = commands::run(&db, args.command).await;
  db.close().await.context("closing quote database")?;

  let output = result?;
  if args.json {
    println!("{}", serde_json::to_string_pretty(&output)?);
  } else {
    print!("{output}");
  }

  Ok(())
}
