//! Core types and trait definitions for the quotes store.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! SQLite engine, the web listing and the admin CLI all depend on it.

// Native `async fn` in traits; the `Send` bounds are spelled out explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod quote;
pub mod rank;
pub mod store;
pub mod vote;

pub use error::{Error, Result};
