//! Pure helpers behind the ACCUMULATING phase and `triggerChallenge`. The
//! `ChampionRecord` itself lives in `model::champion`; this module computes
//! over it without owning engine state.

use crate::ids::IdeaId;
use crate::model::ChampionRecord;
use crate::Millis;

/// `checkAccumulationTimeout`: a pure reminder signal. Firing never
/// discards accumulated ideas — it only reports that the deadline passed
/// and resets it, per spec §4.8 / §9 Open Question 4.
pub struct AccumulationTimer;

impl AccumulationTimer {
    pub fn check(record: &mut ChampionRecord, now: Millis, period_ms: Millis) -> bool {
        if now >= record.accumulation_deadline {
            record.accumulation_deadline = now + period_ms;
            true
        } else {
            false
        }
    }
}

/// assemble the idea roster for a fresh challenge: every accumulated idea,
/// plus enough recyclable ideas (taken in stored order) to reach
/// `threshold` if the accumulated count alone falls short. Does not include
/// the champion itself — the engine seeds that separately as a `Defending`
/// idea, since doing so requires minting a fresh `IdeaId`/tier assignment
/// this module has no business owning.
pub fn assemble_challengers(accumulated: &[IdeaId], recyclable: &[IdeaId], threshold: usize) -> Vec<IdeaId> {
    let mut contest = accumulated.to_vec();
    if contest.len() < threshold {
        let need = threshold - contest.len();
        contest.extend(recyclable.iter().take(need).copied());
    }
    contest
}
