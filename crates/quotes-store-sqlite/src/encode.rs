//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; vote directions as +1/-1.

use chrono::{DateTime, Utc};
use quotes_core::quote::{Quote, QuoteId, RatedQuote, VoteTally};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a [`rated_query`](crate::schema::rated_query) row.
pub struct RawRatedQuote {
  pub id:         i64,
  pub created_at: String,
  pub author:     String,
  pub text:       String,
  pub upvotes:    i64,
  pub downvotes:  i64,
}

impl RawRatedQuote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawRatedQuote {
      id:         row.get(0)?,
      created_at: row.get(1)?,
      author:     row.get(2)?,
      text:       row.get(3)?,
      upvotes:    row.get(4)?,
      downvotes:  row.get(5)?,
    })
  }

  pub fn into_rated(self) -> Result<RatedQuote> {
    Ok(RatedQuote {
      quote: Quote {
        id:         QuoteId(self.id),
        created_at: decode_dt(&self.created_at)?,
        author:     self.author,
        text:       self.text,
      },
      votes: VoteTally {
        up:   self.upvotes.max(0) as u64,
        down: self.downvotes.max(0) as u64,
      },
    })
  }
}
