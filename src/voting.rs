// Vote arithmetic shared by the server aggregator and the client cache.
// Pure, no I/O.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a single ledger entry. There is no neutral value: absence of
/// an entry is how "not voted" is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Normalize any raw client value to a direction: positive is an
    /// upvote, everything else (zero included) is a downvote.
    pub fn from_raw(value: i32) -> Self {
        if value > 0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn value(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl From<VoteDirection> for i32 {
    fn from(direction: VoteDirection) -> Self {
        direction.value()
    }
}

impl TryFrom<i32> for VoteDirection {
    type Error = InvalidDirection;

    /// Strict conversion for stored values. Only exactly 1 or -1 are valid.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(InvalidDirection(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDirection(pub i32);

impl fmt::Display for InvalidDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid vote direction {}", self.0)
    }
}

impl std::error::Error for InvalidDirection {}

/// What applying a vote does to the ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No row yet: insert one.
    Insert(VoteDirection),
    /// Row exists with the requested direction: nothing to do.
    Unchanged,
    /// Row exists with the opposite direction: rewrite it in place.
    Flip(VoteDirection),
}

impl VoteTransition {
    pub fn plan(existing: Option<VoteDirection>, requested: VoteDirection) -> Self {
        match existing {
            None => Self::Insert(requested),
            Some(current) if current == requested => Self::Unchanged,
            Some(_) => Self::Flip(requested),
        }
    }

    /// Change to the post's running total. A flip removes the old vote and
    /// adds the new one, hence twice the direction.
    pub fn points_delta(self) -> i64 {
        match self {
            Self::Insert(direction) => i64::from(direction.value()),
            Self::Unchanged => 0,
            Self::Flip(direction) => 2 * i64::from(direction.value()),
        }
    }
}

/// Points adjustment for moving from `previous` to `requested`, or `None`
/// when the vote is a repeat and nothing should change.
pub fn points_delta(previous: Option<VoteDirection>, requested: VoteDirection) -> Option<i64> {
    match VoteTransition::plan(previous, requested) {
        VoteTransition::Unchanged => None,
        transition => Some(transition.points_delta()),
    }
}
