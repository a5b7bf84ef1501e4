//! Quote records and their read-time vote counts.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Store-assigned identifier of a quote. Never reused after deletion.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QuoteId(pub i64);

impl fmt::Display for QuoteId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for QuoteId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim()
      .parse()
      .map(QuoteId)
      .map_err(|_| Error::InvalidQuoteId(s.to_owned()))
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A stored quote. Only `text` can change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
  pub id:         QuoteId,
  pub created_at: DateTime<Utc>,
  pub author:     String,
  pub text:       String,
}

/// Up and down counts for one quote, always derived from the vote ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
  pub up:   u64,
  pub down: u64,
}

impl VoteTally {
  pub fn score(&self) -> i64 { self.up as i64 - self.down as i64 }
}

/// A quote together with its vote counts, as returned by every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedQuote {
  #[serde(flatten)]
  pub quote: Quote,
  pub votes: VoteTally,
}

impl RatedQuote {
  pub fn id(&self) -> QuoteId { self.quote.id }

  pub fn score(&self) -> i64 { self.votes.score() }
}

// ─── Popularity threshold ────────────────────────────────────────────────────

/// Quotes scoring at or below this value are hidden from filtered reads.
///
/// A couple of downvotes do not suppress a quote; three net downvotes do.
pub const SCORE_THRESHOLD: i64 = -2;

pub fn passes_threshold(score: i64) -> bool { score > SCORE_THRESHOLD }

/// Which quotes a listing or random pick may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteFilter {
  /// Every stored quote.
  All,
  /// Only quotes whose score is strictly above [`SCORE_THRESHOLD`].
  #[default]
  AboveThreshold,
}

impl QuoteFilter {
  pub fn from_filter_low(filter_low: bool) -> Self {
    if filter_low { QuoteFilter::AboveThreshold } else { QuoteFilter::All }
  }

  pub fn admits(self, score: i64) -> bool {
    match self {
      QuoteFilter::All => true,
      QuoteFilter::AboveThreshold => passes_threshold(score),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn threshold_is_exclusive() {
    assert!(passes_threshold(-1));
    assert!(!passes_threshold(-2));
    assert!(!passes_threshold(-3));
  }

  #[test]
  fn filter_admits() {
    assert!(QuoteFilter::All.admits(-10));
    assert!(QuoteFilter::AboveThreshold.admits(0));
    assert!(!QuoteFilter::AboveThreshold.admits(-2));
    assert_eq!(QuoteFilter::from_filter_low(true), QuoteFilter::AboveThreshold);
    assert_eq!(QuoteFilter::from_filter_low(false), QuoteFilter::All);
  }

  #[test]
  fn tally_score_can_go_negative() {
    let tally = VoteTally { up: 1, down: 4 };
    assert_eq!(tally.score(), -3);
  }

  #[test]
  fn quote_id_parses() {
    assert_eq!("42".parse::<QuoteId>().unwrap(), QuoteId(42));
    assert_eq!(" 7 ".parse::<QuoteId>().unwrap(), QuoteId(7));
    assert!(matches!("x".parse::<QuoteId>(), Err(Error::InvalidQuoteId(_))));
  }
}
