//! State projector (spec §4.9): the sole external-observer contract. Turns
//! engine-internal storage (maps keyed by id, a vote ledger, a comment
//! graph) into a flat, read-only snapshot a host can serialize or diff.
//! Nothing here mutates; `Engine::get_state` is the only caller.

use crate::engine::Phase;
use crate::ids::CellId;
use crate::ids::ParticipantId;
use crate::model::Cell;
use crate::model::CellStatus;
use crate::model::ChampionRecord;
use crate::model::Comment;
use crate::model::Idea;
use crate::model::Participant;
use crate::votes::Ledger;
use crate::Batch;
use crate::Millis;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub id: CellId,
    pub tier: Tier,
    pub batch: Batch,
    pub participant_ids: Vec<ParticipantId>,
    pub idea_ids: Vec<crate::ids::IdeaId>,
    pub status: CellStatus,
    pub votes_cast: usize,
    pub votes_needed: usize,
    pub quorum_needed: usize,
    pub voting_deadline: Option<Millis>,
    pub finalizes_at: Option<Millis>,
}

/// per-idea tallies within one cell, used by hosts that want a live bar
/// chart without re-deriving it from raw vote slices themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaTally {
    pub idea_id: crate::ids::IdeaId,
    pub points: crate::Points,
    pub voter_count: u32,
}

fn cell_snapshot(cell: &Cell, ledger: &Ledger) -> CellSnapshot {
    CellSnapshot {
        id: cell.id,
        tier: cell.tier,
        batch: cell.batch,
        participant_ids: cell.participant_ids.clone(),
        idea_ids: cell.idea_ids.clone(),
        status: cell.status,
        votes_cast: ledger.voters_in_cell(cell.id).len(),
        votes_needed: cell.votes_needed,
        quorum_needed: cell.quorum_needed,
        voting_deadline: cell.voting_deadline,
        finalizes_at: cell.finalizes_at,
    }
}

/// per-cell idea tallies, ordered the same as `cell.idea_ids`.
pub fn cell_tallies(cell: &Cell, ledger: &Ledger) -> Vec<IdeaTally> {
    cell.idea_ids
        .iter()
        .map(|&idea_id| {
            let (points, voter_count) = ledger.idea_tally_in_cell(cell.id, idea_id);
            IdeaTally {
                idea_id,
                points,
                voter_count,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulationStatus {
    pub accumulated_count: usize,
    pub recyclable_count: usize,
    pub threshold: usize,
    pub accumulation_deadline: Millis,
}

fn accumulation_status(record: &ChampionRecord) -> AccumulationStatus {
    AccumulationStatus {
        accumulated_count: record.accumulated_ideas.len(),
        recyclable_count: record.recyclable_ideas.len(),
        threshold: record.challenge_threshold,
        accumulation_deadline: record.accumulation_deadline,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub phase: Phase,
    pub current_tier: Tier,
    pub participants: Vec<Participant>,
    pub ideas: Vec<Idea>,
    pub cells: Vec<CellSnapshot>,
    pub comments: Vec<Comment>,
    pub champion: Option<ChampionRecord>,
    pub accumulation_status: Option<AccumulationStatus>,
}

/// assemble the full snapshot. Callers hand in borrowed iterators over
/// their own storage rather than the storage itself, so this module never
/// needs to know how `Engine` indexes anything.
#[allow(clippy::too_many_arguments)]
pub fn snapshot<'a>(
    phase: Phase,
    current_tier: Tier,
    participants: impl Iterator<Item = &'a Participant>,
    ideas: impl Iterator<Item = &'a Idea>,
    cells: impl Iterator<Item = &'a Cell>,
    ledger: &Ledger,
    comments: impl Iterator<Item = &'a Comment>,
    champion: Option<&ChampionRecord>,
) -> StateSnapshot {
    StateSnapshot {
        phase,
        current_tier,
        participants: participants.cloned().collect(),
        ideas: ideas.cloned().collect(),
        cells: cells.map(|c| cell_snapshot(c, ledger)).collect(),
        comments: comments.cloned().collect(),
        champion: champion.cloned(),
        accumulation_status: champion.map(accumulation_status),
    }
}
