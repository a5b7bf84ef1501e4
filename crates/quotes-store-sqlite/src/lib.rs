//! SQLite-backed quote engine.
//!
//! [`QuoteDb`] owns the `quotes` record table and the `votes` ledger, keeps a
//! cached record count, and is the only component that opens transactions
//! against either table. Wraps [`tokio_rusqlite`] so all database access runs
//! on a dedicated thread without blocking the async runtime.

mod count;
mod encode;
mod schema;
mod store;

pub mod credentials;
pub mod error;

pub use credentials::WebCredentials;
pub use error::{Error, Result};
pub use store::QuoteDb;
