//! Cached total record count.
//!
//! Mirrors `COUNT(*)` over `quotes`. Loaded from the store at open and nudged
//! only after a mutating statement has committed, so it is never ahead of the
//! store. Rebuilt from scratch on every open.

use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct CountCache {
  total: RwLock<u64>,
}

impl CountCache {
  pub fn new(total: u64) -> Self { Self { total: RwLock::new(total) } }

  pub fn get(&self) -> u64 {
    *self.total.read().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn increment(&self) {
    let mut total = self.total.write().unwrap_or_else(PoisonError::into_inner);
    *total += 1;
  }

  pub fn decrement(&self) {
    let mut total = self.total.write().unwrap_or_else(PoisonError::into_inner);
    *total = total.saturating_sub(1);
  }
}
