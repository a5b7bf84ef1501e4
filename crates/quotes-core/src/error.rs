//! Error types for `quotes-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown vote direction: {0:?}")]
  UnknownDirection(String),

  #[error("invalid quote id: {0:?}")]
  InvalidQuoteId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
