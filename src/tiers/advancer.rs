//! Pure tally/decision logic for `completeTier`. Takes the cells and votes
//! already belonging to one tier and decides which ideas advance, which are
//! eliminated, and whether a single winner has emerged — it never mutates
//! `Idea`/`Cell` records itself, so the engine can compute the whole next
//! tier before committing anything (spec §5 atomicity guarantee).

use crate::ids::CellId;
use crate::ids::IdeaId;
use crate::model::Cell;
use crate::tiebreak::TieBreak;
use crate::votes::Ledger;
use crate::Batch;
use std::collections::BTreeMap;

/// one Tier-1 cell's independent outcome.
#[derive(Debug, Clone)]
pub struct CellOutcome {
    pub cell_id: CellId,
    pub advancing: Vec<IdeaId>,
    pub eliminated: Vec<IdeaId>,
    pub was_zero_vote_cell: bool,
}

/// Tier-1: each cell picks its own winner(s) independently. Ties all
/// advance (no tie-break at Tier 1). A cell with zero votes cast advances
/// every one of its ideas, preserving content on abandonment.
///
/// Independent per-cell, so with the `parallel` feature enabled each
/// cell's tally runs on `rayon`'s pool instead of sequentially — the
/// worst-case O(N·M) tally §5 commits to is exactly the case a large
/// deliberation (thousands of participants, hundreds of cells) pays for.
pub fn advance_tier1(cells: &[&Cell], ledger: &Ledger) -> Vec<CellOutcome> {
    #[cfg(feature = "parallel")]
    {
        use rayon::iter::IntoParallelIterator;
        use rayon::iter::ParallelIterator;
        cells.into_par_iter().map(|&cell| one_cell_outcome(cell, ledger)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        cells.iter().map(|&cell| one_cell_outcome(cell, ledger)).collect()
    }
}

fn one_cell_outcome(cell: &Cell, ledger: &Ledger) -> CellOutcome {
    let totals: Vec<(IdeaId, u32)> = cell
        .idea_ids
        .iter()
        .map(|&idea| (idea, ledger.idea_tally_in_cell(cell.id, idea).0))
        .collect();
    let any_votes = totals.iter().any(|(_, pts)| *pts > 0);
    if !any_votes {
        return CellOutcome {
            cell_id: cell.id,
            advancing: cell.idea_ids.clone(),
            eliminated: Vec::new(),
            was_zero_vote_cell: true,
        };
    }
    let max = totals.iter().map(|(_, pts)| *pts).max().unwrap_or(0);
    let (advancing, eliminated): (Vec<IdeaId>, Vec<IdeaId>) =
        totals.into_iter().partition(|(_, pts)| *pts == max);
    CellOutcome {
        cell_id: cell.id,
        advancing: advancing.into_iter().map(|(id, _)| id).collect(),
        eliminated: eliminated.into_iter().map(|(id, _)| id).collect(),
        was_zero_vote_cell: false,
    }
}

/// one Tier-2+ batch's outcome: exactly one winner (possibly tie-broken).
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch: Batch,
    pub winner: IdeaId,
    pub eliminated: Vec<IdeaId>,
}

/// the overall decision for a completed Tier-2+ round: either a single
/// declared winner (final showdown) or a set of batch winners advancing
/// to the next tier.
#[derive(Debug, Clone)]
pub enum TierAdvanceOutcome {
    BatchWinners(Vec<BatchOutcome>),
    Winner { idea: IdeaId, eliminated: Vec<IdeaId> },
}

/// Tier-2+: group cells by batch, tally each batch's shared idea set
/// across every cell in that batch, and pick the top idea (tie-broken by
/// `tie_break`). `is_final_showdown` collapses this to the single-batch
/// cross-cell tally spec.md §4.6 calls out as declaring a winner
/// immediately rather than merely advancing.
pub fn advance_tier2_plus(
    cells: &[&Cell],
    ledger: &Ledger,
    tie_break: &dyn TieBreak,
    idea_lookup: &dyn Fn(IdeaId) -> crate::model::Idea,
    is_final_showdown: bool,
) -> TierAdvanceOutcome {
    let mut by_batch: BTreeMap<Batch, Vec<&Cell>> = BTreeMap::new();
    for &cell in cells {
        by_batch.entry(cell.batch).or_default().push(cell);
    }

    let mut outcomes = Vec::with_capacity(by_batch.len());
    for (batch, batch_cells) in by_batch {
        let idea_ids = &batch_cells[0].idea_ids;
        let cell_ids: Vec<CellId> = batch_cells.iter().map(|c| c.id).collect();
        let totals: Vec<(IdeaId, u32)> = idea_ids
            .iter()
            .map(|&idea| (idea, ledger.idea_tally_across_cells(&cell_ids, idea).0))
            .collect();
        let max = totals.iter().map(|(_, pts)| *pts).max().unwrap_or(0);
        let tied: Vec<IdeaId> = totals
            .iter()
            .filter(|(_, pts)| *pts == max)
            .map(|(id, _)| *id)
            .collect();
        let winner = if tied.len() == 1 {
            tied[0]
        } else {
            let owned: Vec<crate::model::Idea> = tied.iter().map(|&id| idea_lookup(id)).collect();
            let refs: Vec<&crate::model::Idea> = owned.iter().collect();
            tied[tie_break.pick(&refs)]
        };
        let eliminated = idea_ids.iter().copied().filter(|id| *id != winner).collect();
        outcomes.push(BatchOutcome {
            batch,
            winner,
            eliminated,
        });
    }

    if is_final_showdown {
        let only = outcomes.into_iter().next().expect("final showdown has exactly one batch");
        TierAdvanceOutcome::Winner {
            idea: only.winner,
            eliminated: only.eliminated,
        }
    } else {
        TierAdvanceOutcome::BatchWinners(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdMint;
    use crate::model::Idea;

    fn make_cell(mint: &mut IdMint, tier: u32, batch: u32, ideas: Vec<IdeaId>, n: usize) -> Cell {
        let pids = (0..n).map(|_| mint.participant()).collect();
        Cell::new(mint.cell(), tier, batch, pids, ideas, 0.5, 0)
    }

    #[test]
    fn scenario_s3_tie_at_tier1_both_advance() {
        let mut mint = IdMint::new();
        let a = mint.idea();
        let b = mint.idea();
        let c = mint.idea();
        let cell = make_cell(&mut mint, 1, 0, vec![a, b, c], 5);
        let mut ledger = Ledger::new();
        // two voters give 10+10 = 20 to A, two give 10+10=20 to B, one gives 10 to C.
        for pid in &cell.participant_ids[0..2] {
            ledger
                .cast(&cell, *pid, &[(a, 10)], 10, false, 1, 0, &mut mint)
                .unwrap();
        }
        for pid in &cell.participant_ids[2..4] {
            ledger
                .cast(&cell, *pid, &[(b, 10)], 10, false, 1, 0, &mut mint)
                .unwrap();
        }
        ledger
            .cast(&cell, cell.participant_ids[4], &[(c, 10)], 10, false, 1, 0, &mut mint)
            .unwrap();

        let outcome = &advance_tier1(&[&cell], &ledger)[0];
        assert_eq!(outcome.advancing.len(), 2);
        assert!(outcome.advancing.contains(&a));
        assert!(outcome.advancing.contains(&b));
        assert!(outcome.eliminated.contains(&c));
    }

    #[test]
    fn scenario_s4_abandoned_cell_all_advance() {
        let mut mint = IdMint::new();
        let a = mint.idea();
        let b = mint.idea();
        let cell = make_cell(&mut mint, 1, 0, vec![a, b], 3);
        let ledger = Ledger::new();
        let outcome = &advance_tier1(&[&cell], &ledger)[0];
        assert!(outcome.was_zero_vote_cell);
        assert_eq!(outcome.advancing.len(), 2);
        assert!(outcome.eliminated.is_empty());
    }

    #[test]
    fn final_showdown_cross_cell_tally_picks_one_winner() {
        let mut mint = IdMint::new();
        let a = mint.idea();
        let b = mint.idea();
        let cells: Vec<Cell> = (0..2)
            .map(|_| make_cell(&mut mint, 2, 0, vec![a, b], 3))
            .collect();
        let mut ledger = Ledger::new();
        for cell in &cells {
            for pid in &cell.participant_ids {
                ledger
                    .cast(cell, *pid, &[(a, 10)], 10, false, 2, 0, &mut mint)
                    .unwrap();
            }
        }
        let refs: Vec<&Cell> = cells.iter().collect();
        let lookup = |id: IdeaId| Idea::new(id, String::new(), None, 2, 0, false);
        let outcome = advance_tier2_plus(&refs, &ledger, &crate::tiebreak::ByIdeaId, &lookup, true);
        match outcome {
            TierAdvanceOutcome::Winner { idea, eliminated } => {
                assert_eq!(idea, a);
                assert_eq!(eliminated, vec![b]);
            }
            _ => panic!("expected a declared winner"),
        }
    }

    #[test]
    fn batch_winners_tie_break_by_lowest_idea_id() {
        let mut mint = IdMint::new();
        let a = mint.idea();
        let b = mint.idea();
        let cell = make_cell(&mut mint, 2, 0, vec![a, b], 4);
        let mut ledger = Ledger::new();
        ledger
            .cast(&cell, cell.participant_ids[0], &[(a, 10)], 10, false, 2, 0, &mut mint)
            .unwrap();
        ledger
            .cast(&cell, cell.participant_ids[1], &[(b, 10)], 10, false, 2, 0, &mut mint)
            .unwrap();
        let refs = vec![&cell];
        let lookup = |id: IdeaId| Idea::new(id, String::new(), None, 2, 0, false);
        let outcome = advance_tier2_plus(&refs, &ledger, &crate::tiebreak::ByIdeaId, &lookup, false);
        match outcome {
            TierAdvanceOutcome::BatchWinners(batches) => {
                assert_eq!(batches.len(), 1);
                assert_eq!(batches[0].winner, a);
            }
            _ => panic!("expected batch winners"),
        }
    }
}
