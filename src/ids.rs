//! Opaque identifiers and the monotonic minting counters behind them.
//!
//! The engine never parses an id's numeric suffix back out — ids are
//! compared and hashed, never decoded. The `p-<n>` / `idea-<n>` / ... shapes
//! are cosmetic, matching the suggested identifier format.

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

macro_rules! opaque_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub(crate) fn new(n: u64) -> Self {
                Self(n)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

opaque_id!(ParticipantId, "p-");
opaque_id!(IdeaId, "idea-");
opaque_id!(CellId, "cell-");
opaque_id!(VoteId, "vote-");
opaque_id!(CommentId, "comment-");

/// one monotonic counter per id kind, owned by the engine. Deterministic
/// given replay order, which the replay-determinism law depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdMint {
    participants: u64,
    ideas: u64,
    cells: u64,
    votes: u64,
    comments: u64,
}

impl IdMint {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn participant(&mut self) -> ParticipantId {
        self.participants += 1;
        ParticipantId::new(self.participants)
    }
    pub fn idea(&mut self) -> IdeaId {
        self.ideas += 1;
        IdeaId::new(self.ideas)
    }
    pub fn cell(&mut self) -> CellId {
        self.cells += 1;
        CellId::new(self.cells)
    }
    pub fn vote(&mut self) -> VoteId {
        self.votes += 1;
        VoteId::new(self.votes)
    }
    pub fn comment(&mut self) -> CommentId {
        self.comments += 1;
        CommentId::new(self.comments)
    }
}
