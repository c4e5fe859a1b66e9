use crate::ids::CellId;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::ids::VoteId;
use crate::Millis;
use crate::Points;
use serde::Deserialize;
use serde::Serialize;

/// the atomic unit of vote acceptance: one participant's allocation of
/// points to a single idea within a single cell. A participant's full
/// ballot in one cell is the set of slices sharing `(cell_id,
/// participant_id)`, whose `points` must sum to exactly
/// `config.vote_points_per_voter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSlice {
    pub id: VoteId,
    pub cell_id: CellId,
    pub participant_id: ParticipantId,
    pub idea_id: IdeaId,
    pub points: Points,
    pub voted_at: Millis,
    pub is_second_vote: bool,
}
