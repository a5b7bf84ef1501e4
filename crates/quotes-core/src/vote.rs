//! Vote directions and the per-(quote, voter) state machine.
//!
//! Each voter holds at most one vote per quote. The ledger only ever sees
//! deletes and inserts; a direction change is a delete of the old row followed
//! by an insert of the new one, so `cast_at` always reflects the latest cast.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Direction ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Up,
  Down,
}

impl Direction {
  /// Signed contribution to a quote's score.
  pub fn as_sign(self) -> i64 {
    match self {
      Direction::Up => 1,
      Direction::Down => -1,
    }
  }

  pub fn from_sign(sign: i64) -> Option<Self> {
    match sign {
      1 => Some(Direction::Up),
      -1 => Some(Direction::Down),
      _ => None,
    }
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Direction::Up => "up",
      Direction::Down => "down",
    })
  }
}

impl FromStr for Direction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "up" => Ok(Direction::Up),
      "down" => Ok(Direction::Down),
      _ => Err(Error::UnknownDirection(s.to_owned())),
    }
  }
}

// ─── State machine ───────────────────────────────────────────────────────────

/// A requested change to one voter's vote on one quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOp {
  Upvote,
  Downvote,
  Unvote,
}

impl VoteOp {
  fn target(self) -> VoteState {
    match self {
      VoteOp::Upvote => VoteState::Up,
      VoteOp::Downvote => VoteState::Down,
      VoteOp::Unvote => VoteState::None,
    }
  }
}

/// What a voter currently holds on a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteState {
  #[default]
  None,
  Up,
  Down,
}

impl VoteState {
  pub fn direction(self) -> Option<Direction> {
    match self {
      VoteState::None => None,
      VoteState::Up => Some(Direction::Up),
      VoteState::Down => Some(Direction::Down),
    }
  }

  /// Plan the ledger writes needed to apply `op` from this state.
  pub fn apply(self, op: VoteOp) -> Transition {
    let to = op.target();
    if to == self {
      return Transition { from: self, to, remove_existing: false, insert: None };
    }
    Transition {
      from: self,
      to,
      remove_existing: self != VoteState::None,
      insert: to.direction(),
    }
  }
}

impl From<Option<Direction>> for VoteState {
  fn from(direction: Option<Direction>) -> Self {
    match direction {
      None => VoteState::None,
      Some(Direction::Up) => VoteState::Up,
      Some(Direction::Down) => VoteState::Down,
    }
  }
}

/// The ledger writes for one vote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub from:            VoteState,
  pub to:              VoteState,
  /// Delete the voter's existing row before anything else.
  pub remove_existing: bool,
  /// Insert a fresh row with this direction.
  pub insert:          Option<Direction>,
}

impl Transition {
  /// `true` when the operation altered the ledger.
  pub fn changed(&self) -> bool { self.from != self.to }
}
