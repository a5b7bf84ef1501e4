//! Caller-side ranking of listings.
//!
//! The store always returns listings newest first; sorting by score is a
//! presentation choice applied to the returned sequence.

use std::cmp::Reverse;

use crate::quote::RatedQuote;

/// Sort by score descending; equal scores put the higher (newer) id first.
pub fn rank_by_score(quotes: &mut [RatedQuote]) {
  quotes.sort_by_key(|q| (Reverse(q.score()), Reverse(q.id())));
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::quote::{Quote, QuoteId, VoteTally};

  fn rated(id: i64, up: u64, down: u64) -> RatedQuote {
    RatedQuote {
      quote: Quote {
        id:         QuoteId(id),
        created_at: Utc::now(),
        author:     "someone".into(),
        text:       format!("quote {id}"),
      },
      votes: VoteTally { up, down },
    }
  }

  #[test]
  fn ranks_by_score_then_newest() {
    let mut quotes = vec![
      rated(5, 0, 0),
      rated(4, 3, 1),
      rated(3, 0, 2),
      rated(2, 2, 0),
      rated(1, 1, 0),
    ];
    rank_by_score(&mut quotes);
    let ids: Vec<i64> = quotes.iter().map(|q| q.id().0).collect();
    assert_eq!(ids, vec![4, 2, 1, 5, 3]);
  }

  #[test]
  fn empty_is_fine() {
    let mut quotes: Vec<RatedQuote> = vec![];
    rank_by_score(&mut quotes);
    assert!(quotes.is_empty());
  }
}
