//! The data model (spec §3): participants, ideas, cells, votes, comments,
//! and the champion record. Each lives in its own file, mirroring the
//! teacher's `cards/` directory (one small file per concept: `card.rs`,
//! `deck.rs`, `hand.rs`, ...).

pub mod cell;
pub mod champion;
pub mod comment;
pub mod idea;
pub mod participant;
pub mod vote;

pub use cell::Cell;
pub use cell::CellStatus;
pub use champion::ChampionRecord;
pub use champion::OriginalRunStats;
pub use comment::Comment;
pub use idea::Idea;
pub use idea::IdeaStatus;
pub use participant::Participant;
pub use participant::ParticipantKind;
pub use vote::VoteSlice;
