//! Vote ledger (spec §4.4): accepts point allocations, enforces
//! `sum(points) == vote_points_per_voter` and per-cell ballot uniqueness,
//! and aggregates per-idea totals.

use crate::ids::CellId;
use crate::ids::IdMint;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::ids::VoteId;
use crate::model::Cell;
use crate::model::VoteSlice;
use crate::Error;
use crate::Millis;
use crate::Points;
use crate::Result;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

/// all vote slices ever accepted, indexed for replacement and tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    slices: Vec<VoteSlice>,
    /// (cell, participant) -> indices into `slices` still live (not
    /// replaced). Replacement removes the old indices before the new
    /// ballot's slices are appended and re-indexed.
    by_ballot: HashMap<(CellId, ParticipantId), Vec<usize>>,
    /// participants who have used their one extra allocation for a tier.
    second_votes_used: HashMap<(Tier, ParticipantId), bool>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, cell: CellId, participant: ParticipantId) -> bool {
        self.by_ballot
            .get(&(cell, participant))
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    pub fn voters_in_cell(&self, cell: CellId) -> HashSet<ParticipantId> {
        self.by_ballot
            .keys()
            .filter(|(c, _)| *c == cell)
            .map(|(_, p)| *p)
            .collect()
    }

    pub fn used_second_vote(&self, tier: Tier, participant: ParticipantId) -> bool {
        self.second_votes_used
            .get(&(tier, participant))
            .copied()
            .unwrap_or(false)
    }

    /// cast (or replace) a ballot. Validates the allocation shape but not
    /// cell membership or phase — those are the engine's job, since the
    /// ledger has no notion of "cell is open" beyond what its caller tells
    /// it via `cell`.
    pub fn cast(
        &mut self,
        cell: &Cell,
        participant_id: ParticipantId,
        allocations: &[(IdeaId, Points)],
        points_per_voter: Points,
        is_second_vote: bool,
        tier: Tier,
        now: Millis,
        mint: &mut IdMint,
    ) -> Result<Vec<VoteSlice>> {
        Self::validate_allocation(cell, allocations, points_per_voter)?;

        if is_second_vote {
            if self.used_second_vote(tier, participant_id) {
                return Err(Error::SecondVoteAlreadyUsed {
                    participant: participant_id,
                    tier,
                });
            }
        } else if let Some(existing) = self.by_ballot.get(&(cell.id, participant_id)) {
            // replacement: remove prior slices for this (cell, participant).
            if !existing.is_empty() {
                self.remove_ballot(cell.id, participant_id);
            }
        }

        let mut new_indices = Vec::with_capacity(allocations.len());
        let mut new_slices = Vec::with_capacity(allocations.len());
        for &(idea_id, points) in allocations {
            let slice = VoteSlice {
                id: mint.vote(),
                cell_id: cell.id,
                participant_id,
                idea_id,
                points,
                voted_at: now,
                is_second_vote,
            };
            new_indices.push(self.slices.len());
            self.slices.push(slice);
            new_slices.push(slice);
        }

        if is_second_vote {
            // second votes land in a different cell than the participant's
            // first ballot, so they extend rather than replace that cell's
            // ballot index.
            self.by_ballot
                .entry((cell.id, participant_id))
                .or_default()
                .extend(new_indices);
            self.second_votes_used.insert((tier, participant_id), true);
        } else {
            self.by_ballot.insert((cell.id, participant_id), new_indices);
        }

        Ok(new_slices)
    }

    fn remove_ballot(&mut self, cell: CellId, participant: ParticipantId) {
        if let Some(indices) = self.by_ballot.remove(&(cell, participant)) {
            let dead: HashSet<usize> = indices.into_iter().collect();
            // tombstone by zeroing points rather than shifting the vector,
            // so every other stored index stays valid.
            for i in dead {
                self.slices[i].points = 0;
            }
        }
    }

    fn validate_allocation(
        cell: &Cell,
        allocations: &[(IdeaId, Points)],
        points_per_voter: Points,
    ) -> Result<()> {
        if allocations.is_empty() {
            return Err(Error::AllocationInvalid {
                reason: "no allocations given".into(),
            });
        }
        let mut seen = HashSet::new();
        let mut sum: Points = 0;
        for &(idea_id, points) in allocations {
            if points == 0 {
                return Err(Error::AllocationInvalid {
                    reason: format!("points for {idea_id} must be positive"),
                });
            }
            if !cell.has_idea(idea_id) {
                return Err(Error::AllocationInvalid {
                    reason: format!("idea {idea_id} is not in cell {}", cell.id),
                });
            }
            if !seen.insert(idea_id) {
                return Err(Error::AllocationInvalid {
                    reason: format!("duplicate allocation to idea {idea_id}"),
                });
            }
            sum += points;
        }
        if sum != points_per_voter {
            return Err(Error::AllocationInvalid {
                reason: format!("allocations must sum to {points_per_voter}, got {sum}"),
            });
        }
        Ok(())
    }

    /// total points and distinct-voter count for one idea within one cell.
    /// Tombstoned (zero-point) slices never contribute.
    pub fn idea_tally_in_cell(&self, cell: CellId, idea: IdeaId) -> (Points, u32) {
        let mut points = 0;
        let mut voters = HashSet::new();
        for slice in &self.slices {
            if slice.cell_id == cell && slice.idea_id == idea && slice.points > 0 {
                points += slice.points;
                voters.insert(slice.participant_id);
            }
        }
        (points, voters.len() as u32)
    }

    /// total points and distinct-voter count for one idea across a set of
    /// cells, used for Tier-2+ batch/cross-cell tallies.
    pub fn idea_tally_across_cells(&self, cells: &[CellId], idea: IdeaId) -> (Points, u32) {
        let cell_set: HashSet<CellId> = cells.iter().copied().collect();
        let mut points = 0;
        let mut voters = HashSet::new();
        for slice in &self.slices {
            if cell_set.contains(&slice.cell_id) && slice.idea_id == idea && slice.points > 0 {
                points += slice.points;
                voters.insert(slice.participant_id);
            }
        }
        (points, voters.len() as u32)
    }

    pub fn slices_for_cell(&self, cell: CellId) -> Vec<&VoteSlice> {
        self.slices
            .iter()
            .filter(|s| s.cell_id == cell && s.points > 0)
            .collect()
    }

    #[allow(dead_code)]
    pub(crate) fn vote_ids_for_cell(&self, cell: CellId) -> Vec<VoteId> {
        self.slices
            .iter()
            .filter(|s| s.cell_id == cell)
            .map(|s| s.id)
            .collect()
    }
}
