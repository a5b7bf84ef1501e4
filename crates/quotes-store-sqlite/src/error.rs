//! Error type for `quotes-store-sqlite`.

use quotes_core::quote::QuoteId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The backing store could not be opened or its schema materialised.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] tokio_rusqlite::Error),

  /// The engine was used after [`QuoteDb::close`](crate::QuoteDb::close).
  #[error("engine is closed")]
  EngineClosed,

  #[error("quote not found: {0}")]
  NotFound(QuoteId),

  /// A random pick found no quote admitted by the filter.
  #[error("no quote matches the filter")]
  NoCandidates,

  /// A step of a multi-statement operation failed; nothing was committed.
  #[error("{op} transaction failed: {source}")]
  TransactionFailed {
    op:     &'static str,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("web credentials: {0}")]
  Credentials(String),
}

impl Error {
  /// `true` for both the missing-id and the empty-candidate-set cases.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::NotFound(_) | Error::NoCandidates)
  }

  pub(crate) fn transaction(op: &'static str, source: tokio_rusqlite::Error) -> Self {
    match source {
      tokio_rusqlite::Error::ConnectionClosed => Error::EngineClosed,
      source => Error::TransactionFailed { op, source },
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::ConnectionClosed => Error::EngineClosed,
      e => Error::Database(e),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
