//! [`QuoteDb`] — the SQLite quote engine and its [`QuoteStore`] impl.

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::{debug, info, warn};

use quotes_core::{
  quote::{QuoteFilter, QuoteId, RatedQuote, SCORE_THRESHOLD, VoteTally},
  store::QuoteStore,
  vote::{Direction, Transition, VoteOp, VoteState},
};

use crate::{
  Error, Result,
  count::CountCache,
  credentials::WebCredentials,
  encode::{RawRatedQuote, encode_dt},
  schema::{SCHEMA, rated_query},
};

// ─── Engine ──────────────────────────────────────────────────────────────────

/// A quote engine backed by a single SQLite file.
///
/// Cloning is cheap; clones share the connection, the cached count and the
/// closed flag.
#[derive(Clone)]
pub struct QuoteDb {
  pub(crate) conn: tokio_rusqlite::Connection,
  count:       Arc<CountCache>,
  closed:      Arc<AtomicBool>,
  credentials: Option<Arc<WebCredentials>>,
}

impl QuoteDb {
  /// Open (or create) an engine at `path`, materialise the schema and load
  /// the record count.
  ///
  /// `auth_secret` is an optional `user:password` pair for the web listing.
  pub async fn open(path: impl AsRef<Path>, auth_secret: Option<&str>) -> Result<Self> {
    let credentials = parse_secret(auth_secret)?;
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::StoreUnavailable)?;
    Self::init(conn, credentials).await
  }

  /// Open an in-memory engine, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::StoreUnavailable)?;
    Self::init(conn, None).await
  }

  async fn init(
    conn: tokio_rusqlite::Connection,
    credentials: Option<WebCredentials>,
  ) -> Result<Self> {
    let loaded = conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM quotes", [], |r| r.get(0))?;
        Ok(n)
      })
      .await;

    let total = match loaded {
      Ok(n) => n.max(0) as u64,
      Err(e) => {
        // The engine is never handed out half-initialised.
        if let Err(close_err) = conn.close().await {
          warn!(error = %close_err, "failed to close store after init failure");
        }
        return Err(Error::StoreUnavailable(e));
      }
    };

    info!(quotes = total, "quote store opened");

    Ok(Self {
      conn,
      count: Arc::new(CountCache::new(total)),
      closed: Arc::new(AtomicBool::new(false)),
      credentials: credentials.map(Arc::new),
    })
  }

  /// Release the backing store. Every later call on this engine or any of its
  /// clones fails with [`Error::EngineClosed`].
  pub async fn close(&self) -> Result<()> {
    if self.closed.swap(true, Ordering::SeqCst) {
      return Err(Error::EngineClosed);
    }
    self.conn.clone().close().await?;
    info!("quote store closed");
    Ok(())
  }

  /// Credentials supplied at open, if any.
  pub fn credentials(&self) -> Option<&WebCredentials> { self.credentials.as_deref() }

  fn ensure_open(&self) -> Result<()> {
    if self.closed.load(Ordering::SeqCst) {
      Err(Error::EngineClosed)
    } else {
      Ok(())
    }
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// Store a new quote and return its id. The cached count moves only after
  /// the insert has committed.
  pub async fn add_quote(
    &self,
    author: impl Into<String>,
    text: impl Into<String>,
  ) -> Result<QuoteId> {
    self.ensure_open()?;
    let author = author.into();
    let text = text.into();
    let at_str = encode_dt(Utc::now());

    let id: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO quotes (created_at, author, text) VALUES (?1, ?2, ?3) RETURNING id",
          rusqlite::params![at_str, author, text],
          |r| r.get(0),
        )?)
      })
      .await?;

    self.count.increment();
    debug!(quote_id = id, "added quote");
    Ok(QuoteId(id))
  }

  /// Replace the text of `id`. `Ok(false)` if no quote has that id.
  pub async fn edit_quote(&self, id: QuoteId, text: impl Into<String>) -> Result<bool> {
    self.ensure_open()?;
    let text = text.into();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE quotes SET text = ?1 WHERE id = ?2",
          rusqlite::params![text, id.0],
        )?)
      })
      .await?;

    debug!(quote_id = %id, changed, "edited quote");
    Ok(changed == 1)
  }

  /// Delete `id` and every vote on it as one transaction. `Ok(false)` if no
  /// quote row was removed.
  pub async fn delete_quote(&self, id: QuoteId) -> Result<bool> {
    self.ensure_open()?;

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM votes WHERE quote_id = ?1", [id.0])?;
        let removed = tx.execute("DELETE FROM quotes WHERE id = ?1", [id.0])?;
        tx.commit()?;
        Ok(removed)
      })
      .await
      .map_err(|e| {
        warn!(quote_id = %id, error = %e, "delete rolled back");
        Error::transaction("delete", e)
      })?;

    if removed == 1 {
      self.count.decrement();
    }
    debug!(quote_id = %id, removed, "deleted quote");
    Ok(removed == 1)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  /// `Ok(true)` if the voter now holds an upvote they did not hold before.
  pub async fn upvote(&self, id: QuoteId, voter: impl Into<String>) -> Result<bool> {
    self.cast(id, voter.into(), VoteOp::Upvote).await
  }

  /// `Ok(true)` if the voter now holds a downvote they did not hold before.
  pub async fn downvote(&self, id: QuoteId, voter: impl Into<String>) -> Result<bool> {
    self.cast(id, voter.into(), VoteOp::Downvote).await
  }

  /// `Ok(true)` if the voter had a vote on `id` and it was removed.
  pub async fn unvote(&self, id: QuoteId, voter: impl Into<String>) -> Result<bool> {
    self.cast(id, voter.into(), VoteOp::Unvote).await
  }

  /// Apply one vote operation inside a single write transaction.
  ///
  /// The quote must exist inside the same transaction, otherwise nothing is
  /// written and the call fails with [`Error::NotFound`].
  async fn cast(&self, id: QuoteId, voter: String, op: VoteOp) -> Result<bool> {
    self.ensure_open()?;
    let op_name = match op {
      VoteOp::Upvote => "upvote",
      VoteOp::Downvote => "downvote",
      VoteOp::Unvote => "unvote",
    };
    let at_str = encode_dt(Utc::now());
    let voter_log = voter.clone();

    let outcome: Option<Transition> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
          "SELECT EXISTS(SELECT 1 FROM quotes WHERE id = ?1)",
          [id.0],
          |r| r.get(0),
        )?;
        if !exists {
          // Dropping `tx` rolls back.
          return Ok(None);
        }

        // The CHECK constraint keeps stored directions in {1, -1}.
        let current: Option<i64> = tx
          .query_row(
            "SELECT direction FROM votes WHERE quote_id = ?1 AND voter = ?2",
            rusqlite::params![id.0, voter],
            |r| r.get(0),
          )
          .optional()?;
        let state = VoteState::from(current.and_then(Direction::from_sign));

        let transition = state.apply(op);
        if transition.remove_existing {
          tx.execute(
            "DELETE FROM votes WHERE quote_id = ?1 AND voter = ?2",
            rusqlite::params![id.0, voter],
          )?;
        }
        if let Some(direction) = transition.insert {
          tx.execute(
            "INSERT INTO votes (quote_id, voter, direction, cast_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id.0, voter, direction.as_sign(), at_str],
          )?;
        }

        tx.commit()?;
        Ok(Some(transition))
      })
      .await
      .map_err(|e| {
        warn!(quote_id = %id, voter = %voter_log, error = %e, "{op_name} rolled back");
        Error::transaction(op_name, e)
      })?;

    let transition = outcome.ok_or(Error::NotFound(id))?;
    debug!(
      quote_id = %id,
      voter = %voter_log,
      from = ?transition.from,
      to = ?transition.to,
      "{op_name}"
    );
    Ok(transition.changed())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Up and down counts for `id`, each a direct aggregate over the ledger.
  ///
  /// An unknown or deleted id has no ledger rows and yields `(0, 0)`.
  pub async fn votes(&self, id: QuoteId) -> Result<VoteTally> {
    self.ensure_open()?;

    let (up, down): (i64, i64) = self
      .conn
      .call(move |conn| {
        let up = conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE quote_id = ?1 AND direction = 1",
          [id.0],
          |r| r.get(0),
        )?;
        let down = conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE quote_id = ?1 AND direction = -1",
          [id.0],
          |r| r.get(0),
        )?;
        Ok((up, down))
      })
      .await?;

    Ok(VoteTally { up: up.max(0) as u64, down: down.max(0) as u64 })
  }

  pub async fn get_quote(&self, id: QuoteId) -> Result<RatedQuote> {
    self.ensure_open()?;
    let sql = rated_query(Some("id = ?1"), "");

    let raw: Option<RawRatedQuote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, [id.0], RawRatedQuote::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.ok_or(Error::NotFound(id))?.into_rated()
  }

  /// A uniformly random quote admitted by `filter`.
  pub async fn random_quote(&self, filter: QuoteFilter) -> Result<RatedQuote> {
    self.ensure_open()?;
    let sql = rated_query(filter_condition(filter).as_deref(), "ORDER BY RANDOM() LIMIT 1");

    let raw: Option<RawRatedQuote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, [], RawRatedQuote::from_row)
            .optional()?,
        )
      })
      .await?;

    let quote = raw.ok_or(Error::NoCandidates)?.into_rated()?;
    debug_assert!(filter.admits(quote.score()));
    Ok(quote)
  }

  /// Every quote admitted by `filter`, newest (highest id) first.
  pub async fn list_all(&self, filter: QuoteFilter) -> Result<Vec<RatedQuote>> {
    self.ensure_open()?;
    let sql = rated_query(filter_condition(filter).as_deref(), "ORDER BY id DESC");

    let raws: Vec<RawRatedQuote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawRatedQuote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let quotes = raws
      .into_iter()
      .map(RawRatedQuote::into_rated)
      .collect::<Result<Vec<_>>>()?;
    debug_assert!(quotes.iter().all(|q| filter.admits(q.score())));
    Ok(quotes)
  }

  /// The cached record count. Never touches the backing store.
  pub fn count(&self) -> Result<u64> {
    self.ensure_open()?;
    Ok(self.count.get())
  }
}

fn parse_secret(secret: Option<&str>) -> Result<Option<WebCredentials>> {
  match secret {
    Some(s) if !s.is_empty() => WebCredentials::from_secret(s),
    _ => Ok(None),
  }
}

fn filter_condition(filter: QuoteFilter) -> Option<String> {
  match filter {
    QuoteFilter::All => None,
    QuoteFilter::AboveThreshold => Some(format!("(upvotes - downvotes) > {SCORE_THRESHOLD}")),
  }
}

// ─── QuoteStore impl ─────────────────────────────────────────────────────────

impl QuoteStore for QuoteDb {
  type Error = Error;

  async fn add_quote(&self, author: String, text: String) -> Result<QuoteId> {
    QuoteDb::add_quote(self, author, text).await
  }

  async fn edit_quote(&self, id: QuoteId, text: String) -> Result<bool> {
    QuoteDb::edit_quote(self, id, text).await
  }

  async fn delete_quote(&self, id: QuoteId) -> Result<bool> {
    QuoteDb::delete_quote(self, id).await
  }

  async fn upvote(&self, id: QuoteId, voter: String) -> Result<bool> {
    QuoteDb::upvote(self, id, voter).await
  }

  async fn downvote(&self, id: QuoteId, voter: String) -> Result<bool> {
    QuoteDb::downvote(self, id, voter).await
  }

  async fn unvote(&self, id: QuoteId, voter: String) -> Result<bool> {
    QuoteDb::unvote(self, id, voter).await
  }

  async fn votes(&self, id: QuoteId) -> Result<VoteTally> {
    QuoteDb::votes(self, id).await
  }

  async fn get_quote(&self, id: QuoteId) -> Result<Option<RatedQuote>> {
    not_found_as_none(QuoteDb::get_quote(self, id).await)
  }

  async fn random_quote(&self, filter: QuoteFilter) -> Result<Option<RatedQuote>> {
    not_found_as_none(QuoteDb::random_quote(self, filter).await)
  }

  async fn list_all(&self, filter: QuoteFilter) -> Result<Vec<RatedQuote>> {
    QuoteDb::list_all(self, filter).await
  }

  fn count(&self) -> Result<u64> { QuoteDb::count(self) }
}

fn not_found_as_none(result: Result<RatedQuote>) -> Result<Option<RatedQuote>> {
  match result {
    Ok(q) => Ok(Some(q)),
    Err(e) if e.is_not_found() => Ok(None),
    Err(e) => Err(e),
  }
}
