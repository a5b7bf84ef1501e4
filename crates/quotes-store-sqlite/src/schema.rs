//! SQL schema for the quotes SQLite store.
//!
//! Executed at every open; `PRAGMA user_version` records the layout so later
//! migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- AUTOINCREMENT: ids of deleted quotes are never handed out again.
CREATE TABLE IF NOT EXISTS quotes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,     -- RFC 3339 UTC; set once
    author      TEXT NOT NULL,
    text        TEXT NOT NULL
);

-- One row per (quote, voter). A changed vote is a delete plus an insert.
-- No ON DELETE CASCADE: the engine removes votes before their quote.
CREATE TABLE IF NOT EXISTS votes (
    quote_id    INTEGER NOT NULL REFERENCES quotes(id),
    voter       TEXT NOT NULL,
    direction   INTEGER NOT NULL CHECK (direction IN (1, -1)),
    cast_at     TEXT NOT NULL,
    PRIMARY KEY (quote_id, voter)
);

CREATE INDEX IF NOT EXISTS quotes_created_idx  ON quotes(created_at);
CREATE INDEX IF NOT EXISTS votes_quote_idx     ON votes(quote_id);
CREATE INDEX IF NOT EXISTS votes_direction_idx ON votes(direction);

PRAGMA user_version = 1;
";

/// Quote columns plus both vote aggregates, computed from the ledger on read.
const RATED_SELECT: &str = "
SELECT q.id, q.created_at, q.author, q.text,
       (SELECT COUNT(*) FROM votes v WHERE v.quote_id = q.id AND v.direction = 1)  AS upvotes,
       (SELECT COUNT(*) FROM votes v WHERE v.quote_id = q.id AND v.direction = -1) AS downvotes
FROM quotes q";

/// Wrap [`RATED_SELECT`] so `condition` and `tail` can refer to `upvotes` and
/// `downvotes`.
pub fn rated_query(condition: Option<&str>, tail: &str) -> String {
  let where_clause = condition
    .map(|c| format!("WHERE {c}"))
    .unwrap_or_default();
  format!("SELECT * FROM ({RATED_SELECT}) {where_clause} {tail}")
}
