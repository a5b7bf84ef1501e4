//! The `QuoteStore` trait.
//!
//! Implemented by storage engines (e.g. `quotes-store-sqlite`). The web layer
//! depends on this abstraction rather than on a concrete backend.

use std::future::Future;

use crate::quote::{QuoteFilter, QuoteId, RatedQuote, VoteTally};

/// Abstraction over a quote engine.
///
/// Every multi-step mutation is all-or-nothing. Outcomes that leave the store
/// untouched (editing a missing id, repeating a vote) are reported as `false`,
/// not as errors.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait QuoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// Store a new quote stamped with the current time; returns its id.
  fn add_quote(
    &self,
    author: String,
    text: String,
  ) -> impl Future<Output = Result<QuoteId, Self::Error>> + Send + '_;

  /// Replace the text of `id`. `false` when no such quote exists.
  fn edit_quote(
    &self,
    id: QuoteId,
    text: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete `id` together with every vote on it. `false` when nothing was
  /// removed.
  fn delete_quote(
    &self,
    id: QuoteId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// `true` when the voter's state changed to up.
  fn upvote(
    &self,
    id: QuoteId,
    voter: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// `true` when the voter's state changed to down.
  fn downvote(
    &self,
    id: QuoteId,
    voter: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// `true` when an existing vote was removed.
  fn unvote(
    &self,
    id: QuoteId,
    voter: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn votes(
    &self,
    id: QuoteId,
  ) -> impl Future<Output = Result<VoteTally, Self::Error>> + Send + '_;

  /// Returns `None` if the quote does not exist.
  fn get_quote(
    &self,
    id: QuoteId,
  ) -> impl Future<Output = Result<Option<RatedQuote>, Self::Error>> + Send + '_;

  /// A uniformly random quote admitted by `filter`, or `None` if there is none.
  fn random_quote(
    &self,
    filter: QuoteFilter,
  ) -> impl Future<Output = Result<Option<RatedQuote>, Self::Error>> + Send + '_;

  /// Every quote admitted by `filter`, newest (highest id) first.
  fn list_all(
    &self,
    filter: QuoteFilter,
  ) -> impl Future<Output = Result<Vec<RatedQuote>, Self::Error>> + Send + '_;

  /// Cached number of stored quotes; does not touch the backing store.
  fn count(&self) -> Result<u64, Self::Error>;
}
