//! Tagged, typed failures for every fallible engine operation (spec §7).
//!
//! Grounded on `riffcc-lis/rhc/src/error.rs`: one flat `thiserror` enum
//! covering preconditions, vote integrity, tier progression, and rolling
//! mode, each variant carrying the fields a caller needs to act on it.
//! Internal invariant violations are a different thing entirely — those
//! are bugs, not expected outcomes, and stay `assert!`/`panic!` at the call
//! site rather than becoming `Error` variants.

use crate::ids::CellId;
use crate::ids::CommentId;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::Tier;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // -- preconditions --
    #[error("operation not allowed in current phase")]
    WrongPhase,

    #[error("need at least {min} participants to start voting, have {got}")]
    TooFewParticipants { min: usize, got: usize },

    #[error("tier-1 cells can hold at most {capacity} ideas for {participants} participants, have {got}")]
    TooManyIdeas {
        capacity: usize,
        participants: usize,
        got: usize,
    },

    #[error("unknown participant {id}")]
    UnknownParticipant { id: ParticipantId },

    #[error("unknown cell {id}")]
    UnknownCell { id: CellId },

    #[error("unknown idea {id}")]
    UnknownIdea { id: IdeaId },

    #[error("unknown comment {id}")]
    UnknownComment { id: CommentId },

    #[error("participant {participant} is not a member of cell {cell}")]
    NotAMember {
        participant: ParticipantId,
        cell: CellId,
    },

    // -- vote integrity --
    #[error("invalid vote allocation: {reason}")]
    AllocationInvalid { reason: String },

    #[error("cell {id} is closed to new votes")]
    CellClosed { id: CellId },

    #[error("participant {participant} already voted in cell {cell}")]
    AlreadyVoted {
        participant: ParticipantId,
        cell: CellId,
    },

    #[error("second votes are not enabled for tier {tier}")]
    SecondVoteNotAllowed { tier: Tier },

    #[error("participant {participant} already used their second vote for tier {tier}")]
    SecondVoteAlreadyUsed {
        participant: ParticipantId,
        tier: Tier,
    },

    // -- tier progression --
    #[error("tier {tier} is not complete: cell {cell} is still open")]
    TierIncomplete { tier: Tier, cell: CellId },

    #[error("no ideas advanced out of tier {tier}")]
    NoIdeasAdvanced { tier: Tier },

    // -- rolling champion --
    #[error("engine is not accumulating a challenge")]
    NotAccumulating,

    #[error("only {got} accumulated ideas, need at least {threshold} to challenge")]
    BelowChallengeThreshold { got: usize, threshold: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
