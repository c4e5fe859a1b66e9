//! Tier-1 cell builder (spec §4.2): disjoint participant and idea slices,
//! ideas spread as evenly as possible subject to `max_ideas_per_cell` and
//! each cell's own size.

use crate::ids::CellId;
use crate::ids::IdMint;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::model::Cell;
use crate::sizer;
use crate::Millis;

/// total ideas Tier-1 cells can hold for `n_participants` participants: each
/// cell's share is capped at `min(cell size, max_ideas_per_cell)`, so this is
/// the sum of that cap over the partition `sizer::sizes` produces. Callers
/// must reject `idea_ids.len() > capacity(...)` before calling `build` — the
/// builder itself never drops an idea, so handing it more ideas than the
/// partition can seat is a caller error, not something `build` resolves.
pub fn capacity(n_participants: usize, max_ideas_per_cell: usize) -> usize {
    sizer::sizes(n_participants)
        .iter()
        .map(|&size| size.min(max_ideas_per_cell))
        .sum()
}

/// build Tier-1 cells from participants and ideas, both given in submission
/// order. Consumes ideas from the head of `idea_ids` cell by cell so the
/// output is reproducible given the same inputs (no shuffling).
///
/// `idea_ids.len()` must not exceed `capacity(participant_ids.len(),
/// max_ideas_per_cell)`; callers enforce that precondition (see
/// `Engine::start_voting`), since silently dropping submitted ideas would
/// violate the idea-count law (spec §8).
pub fn build(
    participant_ids: &[ParticipantId],
    idea_ids: &[IdeaId],
    max_ideas_per_cell: usize,
    quorum_fraction: f64,
    mint: &mut IdMint,
    now: Millis,
) -> Vec<Cell> {
    let blocks = sizer::sizes(participant_ids.len());
    debug_assert!(
        idea_ids.len() <= capacity(participant_ids.len(), max_ideas_per_cell),
        "caller must not hand build() more ideas than the partition can seat"
    );
    let cells_remaining_total = blocks.len();
    let mut cursor_participants = 0usize;
    let mut cursor_ideas = 0usize;
    let mut cells = Vec::with_capacity(blocks.len());

    for (i, &size) in blocks.iter().enumerate() {
        let cells_remaining = cells_remaining_total - i;
        let ideas_remaining = idea_ids.len() - cursor_ideas;
        let max_ideas = size.min(max_ideas_per_cell);
        let fair_share = div_ceil(ideas_remaining, cells_remaining);
        let ideas_for_cell = fair_share.min(max_ideas).min(ideas_remaining);

        let cell_participants =
            participant_ids[cursor_participants..cursor_participants + size].to_vec();
        let cell_ideas = idea_ids[cursor_ideas..cursor_ideas + ideas_for_cell].to_vec();

        cursor_participants += size;
        cursor_ideas += ideas_for_cell;

        let id: CellId = mint.cell();
        cells.push(Cell::new(id, 1, 0, cell_participants, cell_ideas, quorum_fraction, now));
    }

    debug_assert_eq!(cursor_participants, participant_ids.len());
    cells
}

fn div_ceil(a: usize, b: usize) -> usize {
    if b == 0 {
        0
    } else {
        (a + b - 1) / b
    }
}
