//! Subcommands and their printable results.

use std::fmt;

use anyhow::{Context, Result};
use clap::Subcommand;
use quotes_core::{
  quote::{QuoteFilter, QuoteId, RatedQuote, VoteTally},
  rank::rank_by_score,
};
use quotes_store_sqlite::QuoteDb;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Store a new quote and print its id.
  Add {
    author: String,
    text:   String,
  },
  /// Replace the text of a quote.
  Edit {
    id:   QuoteId,
    text: String,
  },
  /// Delete a quote and every vote cast on it.
  Del { id: QuoteId },
  /// Show one quote with its votes.
  Get { id: QuoteId },
  /// Show a random quote.
  Random {
    /// Include quotes voted below the threshold.
    #[arg(long)]
    all: bool,
  },
  /// List quotes, newest first.
  List {
    /// Include quotes voted below the threshold.
    #[arg(long)]
    all:      bool,
    /// Order by score instead of age.
    #[arg(long)]
    votesort: bool,
  },
  Upvote {
    id:    QuoteId,
    voter: String,
  },
  Downvote {
    id:    QuoteId,
    voter: String,
  },
  /// Withdraw a voter's vote.
  Unvote {
    id:    QuoteId,
    voter: String,
  },
  /// Print the up and down counts of a quote.
  Votes { id: QuoteId },
  /// Print the number of stored quotes.
  Count,
}

/// Result of one subcommand. Serialises untagged for `--json`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
  Added { id: QuoteId },
  Changed { changed: bool },
  Quote(RatedQuote),
  Quotes(Vec<RatedQuote>),
  Tally(VoteTally),
  Count { count: u64 },
}

pub async fn run(db: &QuoteDb, command: Command) -> Result<Output> {
  let output = match command {
    Command::Add { author, text } => Output::Added {
      id: db.add_quote(author, text).await.context("adding quote")?,
    },
    Command::Edit { id, text } => Output::Changed {
      changed: db.edit_quote(id, text).await.context("editing quote")?,
    },
    Command::Del { id } => Output::Changed {
      changed: db.delete_quote(id).await.context("deleting quote")?,
    },
    Command::Get { id } => Output::Quote(db.get_quote(id).await?),
    Command::Random { all } => {
      Output::Quote(db.random_quote(QuoteFilter::from_filter_low(!all)).await?)
    }
    Command::List { all, votesort } => {
      let mut quotes = db
        .list_all(QuoteFilter::from_filter_low(!all))
        .await
        .context("listing quotes")?;
      if votesort {
        rank_by_score(&mut quotes);
      }
      Output::Quotes(quotes)
    }
    Command::Upvote { id, voter } => Output::Changed {
      changed: db.upvote(id, voter).await?,
    },
    Command::Downvote { id, voter } => Output::Changed {
      changed: db.downvote(id, voter).await?,
    },
    Command::Unvote { id, voter } => Output::Changed {
      changed: db.unvote(id, voter).await?,
    },
    Command::Votes { id } => Output::Tally(db.votes(id).await?),
    Command::Count => Output::Count { count: db.count()? },
  };
  Ok(output)
}

fn write_quote(f: &mut fmt::Formatter<'_>, rq: &RatedQuote) -> fmt::Result {
  writeln!(
    f,
    "#{} [{:+}] {} ({})",
    rq.id(),
    rq.score(),
    rq.quote.author,
    rq.quote.created_at.format("%Y-%m-%d %H:%M:%S"),
  )?;
  writeln!(f, "  {}", rq.quote.text)
}

impl fmt::Display for Output {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Output::Added { id } => writeln!(f, "{id}"),
      Output::Changed { changed } => {
        writeln!(f, "{}", if *changed { "ok" } else { "unchanged" })
      }
      Output::Quote(rq) => write_quote(f, rq),
      Output::Quotes(quotes) => {
        for rq in quotes {
          write_quote(f, rq)?;
        }
        Ok(())
      }
      Output::Tally(t) => writeln!(f, "+{} -{}", t.up, t.down),
      Output::Count { count } => writeln!(f, "{count}"),
    }
  }
}
