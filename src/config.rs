//! Recognized configuration options, plus the two open-question knobs
//! resolved in DESIGN.md (`TieBreak`, `ChampionDefenseMode`). A plain
//! struct with a `Default` matching every documented default, mutated
//! through a builder-style `with_*` chain — the same "config struct with
//! defaults, constructed once" shape used elsewhere for `Profile`/
//! `Encoder`.

use crate::Millis;
use serde::Deserialize;
use serde::Serialize;

/// champion-defense policy for the rolling mode. `SkipToTier2` is the
/// stated default and simplest policy; `FromTier1` requires the champion
/// to re-win Tier 1 like any other idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChampionDefenseMode {
    SkipToTier2,
    FromTier1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cell_size: usize,
    pub max_ideas_per_cell: usize,
    pub vote_points_per_voter: u32,
    pub quorum_fraction: f64,
    pub voting_timeout_ms: Millis,
    pub finalizes_after_ms: Millis,
    pub accumulation_timer_ms: Millis,
    pub comment_spread_threshold: u32,
    pub target_reduction_ratio: usize,
    pub rolling_mode: bool,
    pub champion_defense_mode: ChampionDefenseMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cell_size: 5,
            max_ideas_per_cell: 7,
            vote_points_per_voter: 10,
            quorum_fraction: 0.5,
            voting_timeout_ms: 0,
            finalizes_after_ms: 10_000,
            accumulation_timer_ms: 24 * 60 * 60 * 1000,
            comment_spread_threshold: 2,
            target_reduction_ratio: 5,
            rolling_mode: false,
            champion_defense_mode: ChampionDefenseMode::SkipToTier2,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_cell_size(mut self, n: usize) -> Self {
        self.cell_size = n;
        self
    }
    pub fn with_max_ideas_per_cell(mut self, n: usize) -> Self {
        self.max_ideas_per_cell = n;
        self
    }
    pub fn with_vote_points_per_voter(mut self, n: u32) -> Self {
        self.vote_points_per_voter = n;
        self
    }
    pub fn with_quorum_fraction(mut self, f: f64) -> Self {
        self.quorum_fraction = f;
        self
    }
    pub fn with_voting_timeout_ms(mut self, ms: Millis) -> Self {
        self.voting_timeout_ms = ms;
        self
    }
    pub fn with_finalizes_after_ms(mut self, ms: Millis) -> Self {
        self.finalizes_after_ms = ms;
        self
    }
    pub fn with_accumulation_timer_ms(mut self, ms: Millis) -> Self {
        self.accumulation_timer_ms = ms;
        self
    }
    pub fn with_comment_spread_threshold(mut self, n: u32) -> Self {
        self.comment_spread_threshold = n;
        self
    }
    pub fn with_target_reduction_ratio(mut self, n: usize) -> Self {
        self.target_reduction_ratio = n;
        self
    }
    pub fn with_rolling_mode(mut self, on: bool) -> Self {
        self.rolling_mode = on;
        self
    }
    pub fn with_champion_defense_mode(mut self, mode: ChampionDefenseMode) -> Self {
        self.champion_defense_mode = mode;
        self
    }
}
