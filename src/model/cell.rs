use crate::ids::CellId;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::Batch;
use crate::Millis;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Voting,
    Deliberating,
    Completed,
}

/// a small discussion group voting over a shared set of ideas within one
/// tier. `votes_needed == participant_ids.len()`;
/// `quorum_needed = ceil(votes_needed * quorum_fraction)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub tier: Tier,
    pub batch: Batch,
    pub participant_ids: Vec<ParticipantId>,
    pub idea_ids: Vec<IdeaId>,
    pub votes_needed: usize,
    pub quorum_needed: usize,
    pub status: CellStatus,
    pub created_at: Millis,
    pub voting_started_at: Option<Millis>,
    pub voting_deadline: Option<Millis>,
    pub finalizes_at: Option<Millis>,
    pub completed_by_timeout: bool,
}

impl Cell {
    pub(crate) fn new(
        id: CellId,
        tier: Tier,
        batch: Batch,
        participant_ids: Vec<ParticipantId>,
        idea_ids: Vec<IdeaId>,
        quorum_fraction: f64,
        created_at: Millis,
    ) -> Self {
        let votes_needed = participant_ids.len();
        let quorum_needed = (votes_needed as f64 * quorum_fraction).ceil() as usize;
        Self {
            id,
            tier,
            batch,
            participant_ids,
            idea_ids,
            votes_needed,
            quorum_needed: quorum_needed.max(1).min(votes_needed.max(1)),
            status: CellStatus::Voting,
            created_at,
            voting_started_at: None,
            voting_deadline: None,
            finalizes_at: None,
            completed_by_timeout: false,
        }
    }

    pub fn has_participant(&self, id: ParticipantId) -> bool {
        self.participant_ids.contains(&id)
    }

    pub fn has_idea(&self, id: IdeaId) -> bool {
        self.idea_ids.contains(&id)
    }

    pub fn is_open(&self) -> bool {
        self.status != CellStatus::Completed
    }
}
