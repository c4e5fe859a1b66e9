use crate::ids::IdeaId;
use crate::Millis;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;

/// statistics captured about the run that produced the sitting champion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalRunStats {
    pub idea_count: usize,
    pub tier_reached: Tier,
    pub completed_at: Millis,
}

/// exists only while `phase == Accumulating` or a defense run is in
/// progress (data model invariant 7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub idea_id: IdeaId,
    pub original_run: OriginalRunStats,
    pub recyclable_ideas: Vec<IdeaId>,
    pub accumulated_ideas: Vec<IdeaId>,
    pub accumulation_started_at: Millis,
    pub accumulation_deadline: Millis,
    pub challenge_threshold: usize,
}

impl ChampionRecord {
    /// `T_ch = max(5, ceil(championRun.ideaCount * 0.5))`, per spec §4.8.
    pub(crate) fn challenge_threshold_for(idea_count: usize) -> usize {
        let half = (idea_count as f64 * 0.5).ceil() as usize;
        half.max(5)
    }
}
