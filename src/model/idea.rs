use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::Millis;
use crate::Points;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdeaStatus {
    Submitted,
    InVoting,
    CellWinner,
    Advancing,
    Eliminated,
    Winner,
    Pending,
    Recycled,
    Defending,
}

/// owned by exactly one deliberation; `tier` monotonically increases as the
/// idea advances, never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: IdeaId,
    pub text: String,
    pub author_id: Option<ParticipantId>,
    pub tier: Tier,
    pub status: IdeaStatus,
    pub total_vote_points: Points,
    pub total_vote_count: u32,
    pub created_at: Millis,
    pub is_new: bool,
    pub is_champion: bool,
}

impl Idea {
    pub(crate) fn new(
        id: IdeaId,
        text: String,
        author_id: Option<ParticipantId>,
        tier: Tier,
        created_at: Millis,
        is_new: bool,
    ) -> Self {
        Self {
            id,
            text,
            author_id,
            tier,
            status: IdeaStatus::Submitted,
            total_vote_points: 0,
            total_vote_count: 0,
            created_at,
            is_new,
            is_champion: false,
        }
    }

    /// reset per-tier vote totals before a new round of voting begins.
    pub(crate) fn reset_tally(&mut self) {
        self.total_vote_points = 0;
        self.total_vote_count = 0;
    }
}
