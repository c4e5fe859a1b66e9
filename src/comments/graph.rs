//! Comment storage, upvotes, same-tier spread ("up-pollination" within a
//! batch) and cross-tier carry (comments following their surviving idea
//! into the next tier's cells). Comments live in their origin cell;
//! propagation is a projection recorded here, never a duplicate record.

use crate::ids::CellId;
use crate::ids::CommentId;
use crate::ids::IdMint;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::model::Comment;
use crate::Error;
use crate::Millis;
use crate::Result;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentGraph {
    comments: HashMap<CommentId, Comment>,
    upvoters: HashMap<CommentId, HashSet<ParticipantId>>,
    /// same-tier, same-batch peer-cell projections (feeds `spread_count`).
    spread_into: HashMap<CommentId, HashSet<CellId>>,
    /// cross-tier carry destinations (feeds visibility at later tiers).
    carried_into: HashMap<CommentId, HashSet<CellId>>,
}

impl CommentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        mint: &mut IdMint,
        cell_id: CellId,
        participant_id: ParticipantId,
        text: String,
        linked_idea_id: Option<IdeaId>,
        reply_to: Option<CommentId>,
        now: Millis,
        tier: Tier,
    ) -> Comment {
        let id = mint.comment();
        let comment = Comment::new(id, cell_id, participant_id, text, linked_idea_id, reply_to, now, tier);
        self.comments.insert(id, comment.clone());
        comment
    }

    pub fn get(&self, id: CommentId) -> Result<&Comment> {
        self.comments.get(&id).ok_or(Error::UnknownComment { id })
    }

    /// monotonic, deduplicated per (comment, participant). Returns whether
    /// this upvote newly crossed `threshold` (the caller should then call
    /// `spread` with that tier's peer cells).
    pub fn upvote(&mut self, id: CommentId, participant_id: ParticipantId, threshold: u32) -> Result<bool> {
        let voters = self.upvoters.entry(id).or_default();
        let is_new = voters.insert(participant_id);
        let comment = self.comments.get_mut(&id).ok_or(Error::UnknownComment { id })?;
        if !is_new {
            return Ok(false);
        }
        let was_below = comment.upvote_count < threshold;
        comment.upvote_count += 1;
        Ok(was_below && comment.upvote_count >= threshold)
    }

    /// project a comment into same-tier peer cells once its upvotes cross
    /// the spread threshold. `candidate_peers` is every peer cell in the
    /// comment's batch that shares its `linked_idea_id` (or every peer cell
    /// in the batch, if unlinked) — computed by the engine, which owns the
    /// cell index this module doesn't.
    pub fn spread(&mut self, id: CommentId, candidate_peers: &[CellId]) -> Result<()> {
        let comment = self.comments.get_mut(&id).ok_or(Error::UnknownComment { id })?;
        let set = self.spread_into.entry(id).or_default();
        for &peer in candidate_peers {
            if peer != comment.cell_id {
                set.insert(peer);
            }
        }
        comment.up_pollinated = true;
        comment.spread_count = set.len() as u32;
        Ok(())
    }

    /// carry comments attached to surviving ideas forward into the next
    /// tier's cells that contain those same ideas. Comments never move
    /// downward — `reach_tier` only ever increases.
    pub fn carry_forward(&mut self, next_tier: Tier, idea_to_cells: &HashMap<IdeaId, Vec<CellId>>) {
        let ids: Vec<CommentId> = self.comments.keys().copied().collect();
        for id in ids {
            let (linked, reach_tier) = {
                let c = self.comments.get(&id).expect("id from self.comments.keys()");
                (c.linked_idea_id, c.reach_tier)
            };
            let Some(idea) = linked else { continue };
            let Some(cells) = idea_to_cells.get(&idea) else { continue };
            if reach_tier >= next_tier {
                continue;
            }
            let dest = self.carried_into.entry(id).or_default();
            for &cell in cells {
                dest.insert(cell);
            }
            let comment = self.comments.get_mut(&id).expect("id from self.comments.keys()");
            comment.reach_tier = next_tier;
            comment.up_pollinated = true;
        }
    }

    /// every comment visible from `cell_id`, ordered per spec §4.7: comments
    /// sourced elsewhere (spread or carried) first by descending
    /// `upvote_count`, then comments originating locally by descending
    /// `upvote_count`, then ascending `created_at`.
    pub fn visible_in(&self, cell_id: CellId) -> Vec<&Comment> {
        let mut external: Vec<&Comment> = self
            .comments
            .values()
            .filter(|c| {
                c.cell_id != cell_id
                    && (self.spread_into.get(&c.id).is_some_and(|s| s.contains(&cell_id))
                        || self.carried_into.get(&c.id).is_some_and(|s| s.contains(&cell_id)))
            })
            .collect();
        external.sort_by(|a, b| b.upvote_count.cmp(&a.upvote_count));

        let mut local: Vec<&Comment> = self.comments.values().filter(|c| c.cell_id == cell_id).collect();
        local.sort_by(|a, b| b.upvote_count.cmp(&a.upvote_count).then(a.created_at.cmp(&b.created_at)));

        external.extend(local);
        external
    }

    pub fn spread_count(&self, id: CommentId) -> u32 {
        self.comments.get(&id).map(|c| c.spread_count).unwrap_or(0)
    }

    /// every stored comment, for the state projector. No ordering guarantee
    /// beyond what `HashMap::values` happens to give.
    pub fn all(&self) -> Vec<&Comment> {
        self.comments.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upvotes_are_deduplicated_per_participant() {
        let mut graph = CommentGraph::new();
        let mut mint = IdMint::new();
        let pid = mint.participant();
        let voter = mint.participant();
        let comment = graph.add(&mut mint, mint.cell(), pid, "nice idea".into(), None, None, 0, 1);
        assert!(!graph.upvote(comment.id, voter, 2).unwrap());
        assert!(!graph.upvote(comment.id, voter, 2).unwrap(), "duplicate upvote is a no-op");
        assert_eq!(graph.get(comment.id).unwrap().upvote_count, 1);
    }

    #[test]
    fn scenario_s5_spread_crosses_threshold_and_counts_peers() {
        let mut graph = CommentGraph::new();
        let mut mint = IdMint::new();
        let author = mint.participant();
        let origin = mint.cell();
        let peer_a = mint.cell();
        let peer_b = mint.cell();
        let idea = mint.idea();
        let comment = graph.add(&mut mint, origin, author, "great".into(), Some(idea), None, 0, 2);

        let v1 = mint.participant();
        let v2 = mint.participant();
        assert!(!graph.upvote(comment.id, v1, 2).unwrap());
        let crossed = graph.upvote(comment.id, v2, 2).unwrap();
        assert!(crossed);

        graph.spread(comment.id, &[origin, peer_a, peer_b]).unwrap();
        assert_eq!(graph.spread_count(comment.id), 2);
        assert!(graph.get(comment.id).unwrap().up_pollinated);

        // monotonic: a further upvote must not decrease the tally.
        let v3 = mint.participant();
        graph.upvote(comment.id, v3, 2).unwrap();
        assert_eq!(graph.get(comment.id).unwrap().upvote_count, 3);
    }

    #[test]
    fn visible_in_orders_external_before_local() {
        let mut graph = CommentGraph::new();
        let mut mint = IdMint::new();
        let pid = mint.participant();
        let home = mint.cell();
        let peer = mint.cell();
        let local = graph.add(&mut mint, home, pid, "local".into(), None, None, 10, 1);
        let foreign = graph.add(&mut mint, peer, pid, "foreign".into(), None, None, 5, 1);
        graph.spread(foreign.id, &[peer, home]).unwrap();

        let visible = graph.visible_in(home);
        assert_eq!(visible[0].id, foreign.id);
        assert_eq!(visible[1].id, local.id);
    }

    #[test]
    fn carry_forward_only_moves_idea_linked_comments() {
        let mut graph = CommentGraph::new();
        let mut mint = IdMint::new();
        let pid = mint.participant();
        let cell1 = mint.cell();
        let idea = mint.idea();
        let linked = graph.add(&mut mint, cell1, pid, "linked".into(), Some(idea), None, 0, 1);
        let unlinked = graph.add(&mut mint, cell1, pid, "general".into(), None, None, 0, 1);

        let cell2 = mint.cell();
        let mut mapping = HashMap::new();
        mapping.insert(idea, vec![cell2]);
        graph.carry_forward(2, &mapping);

        assert_eq!(graph.get(linked.id).unwrap().reach_tier, 2);
        assert_eq!(graph.get(unlinked.id).unwrap().reach_tier, 1);
        let visible = graph.visible_in(cell2);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, linked.id);
    }
}
