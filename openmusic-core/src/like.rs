//! Like toggle state machine.
//!
//! Each (album, user) pair is either [`LikeState::Liked`] or
//! [`LikeState::NotLiked`]. A toggle reads the current membership and applies
//! the single transition that negates it. Stores must perform the read and
//! the transition as one atomic step.

use serde::{Deserialize, Serialize};

/// Membership of one (album, user) pair in the likes relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LikeState {
    Liked,
    NotLiked,
}

/// The mutation a toggle applies to the likes relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTransition {
    /// Insert the tuple with a freshly generated row id.
    Insert,
    /// Delete the tuple.
    Remove,
}

impl LikeState {
    /// State implied by whether a like tuple exists for the pair.
    pub fn from_membership(present: bool) -> Self {
        if present {
            LikeState::Liked
        } else {
            LikeState::NotLiked
        }
    }

    pub fn is_liked(self) -> bool {
        matches!(self, LikeState::Liked)
    }

    /// The transition a toggle applies when the pair is in this state.
    pub fn transition(self) -> LikeTransition {
        match self {
            LikeState::NotLiked => LikeTransition::Insert,
            LikeState::Liked => LikeTransition::Remove,
        }
    }

    /// State after one toggle.
    pub fn toggled(self) -> Self {
        self.transition().target()
    }
}

impl LikeTransition {
    /// State the pair is in once this transition has been applied.
    pub fn target(self) -> LikeState {
        match self {
            LikeTransition::Insert => LikeState::Liked,
            LikeTransition::Remove => LikeState::NotLiked,
        }
    }
}
