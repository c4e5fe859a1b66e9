//! Tie-break policy for Tier-2+ batch winners. Deterministic behavior is
//! required but no single rule is mandated, and implementers are free to
//! expose a callback for alternate policies — so this is a small trait
//! object rather than a hardcoded comparison, with `ByIdeaId` (lowest id,
//! i.e. oldest submission) as the crate's chosen default.

use crate::model::Idea;

/// breaks a tie among ideas sharing the maximum point total in one batch.
/// Receives the tied ideas in iteration order and must return the index
/// (into that slice) of the winner.
pub trait TieBreak: std::fmt::Debug {
    fn pick(&self, tied: &[&Idea]) -> usize;
}

/// lowest `IdeaId` wins, i.e. the idea submitted earliest. This is the
/// default: ids are minted in submission order, so it is equivalent to and
/// cheaper than sorting by `created_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByIdeaId;

impl TieBreak for ByIdeaId {
    fn pick(&self, tied: &[&Idea]) -> usize {
        tied.iter()
            .enumerate()
            .min_by_key(|(_, idea)| idea.id)
            .map(|(i, _)| i)
            .expect("tie-break called with at least one idea")
    }
}

/// oldest `created_at` wins; ties within that fall back to lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByCreatedAt;

impl TieBreak for ByCreatedAt {
    fn pick(&self, tied: &[&Idea]) -> usize {
        tied.iter()
            .enumerate()
            .min_by_key(|(_, idea)| (idea.created_at, idea.id))
            .map(|(i, _)| i)
            .expect("tie-break called with at least one idea")
    }
}
