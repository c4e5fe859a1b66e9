//! Tier-2+ cell builder / batching: final showdown for `m <= 4` advancing
//! ideas, otherwise batches of participants each voting on the same idea
//! set, sized toward `target_reduction_ratio` ideas per batch.

use crate::ids::CellId;
use crate::ids::IdMint;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::model::Cell;
use crate::sizer;
use crate::Batch;
use crate::Millis;
use crate::Tier;

/// output of a Tier-2+ build: the cells themselves, and whether this tier
/// collapsed to a single batch — either because `m <= 4` (the named
/// final-showdown case) or because the reduction ratio alone already fits
/// every idea in one batch. Both shapes are identical on the wire (one
/// batch, every cell shares all `m` ideas) and are treated the same way: a
/// cross-cell tally that declares a winner immediately.
pub struct BatchPlan {
    pub cells: Vec<Cell>,
    pub is_final_showdown: bool,
}

pub fn build(
    advancing_ideas: &[IdeaId],
    participant_ids: &[ParticipantId],
    tier: Tier,
    max_ideas_per_cell: usize,
    target_reduction_ratio: usize,
    quorum_fraction: f64,
    mint: &mut IdMint,
    now: Millis,
) -> BatchPlan {
    let m = advancing_ideas.len();
    let ideal_ideas_per_batch = max_ideas_per_cell.min(target_reduction_ratio);
    let batches_needed = div_ceil(m, ideal_ideas_per_batch).max(1);

    if m <= 4 || batches_needed == 1 {
        // one batch, every cell shares all m ideas.
        let blocks = sizer::sizes(participant_ids.len());
        let mut cursor = 0usize;
        let mut cells = Vec::with_capacity(blocks.len());
        for &size in &blocks {
            let cell_participants = participant_ids[cursor..cursor + size].to_vec();
            cursor += size;
            let id = mint.cell();
            cells.push(Cell::new(
                id,
                tier,
                0,
                cell_participants,
                advancing_ideas.to_vec(),
                quorum_fraction,
                now,
            ));
        }
        return BatchPlan {
            cells,
            is_final_showdown: true,
        };
    }

    let participant_blocks = sizer::sizes(participant_ids.len());
    // `batches_needed` is sized off the idea count alone; it must not ask
    // `split_into_groups` for more batches than there are participant
    // blocks to hand out (each batch needs >=1 block), or the grouping
    // would overcommit blocks that don't exist. Clamping here means fewer,
    // larger batches rather than a panic when ideas outnumber blocks.
    let batches_needed = batches_needed.min(participant_blocks.len()).max(1);
    let batch_participant_groups = split_into_groups(participant_blocks.len(), batches_needed);

    let mut cells = Vec::new();
    let mut idea_cursor = 0usize;
    let mut cell_block_cursor = 0usize;
    let mut participant_cursor = 0usize;

    for (batch_idx, &num_cells_in_batch) in batch_participant_groups.iter().enumerate() {
        let ideas_remaining = m - idea_cursor;
        let batches_remaining = batches_needed - batch_idx;
        let ideas_for_batch = div_ceil(ideas_remaining, batches_remaining).min(ideas_remaining);
        let batch_ideas = advancing_ideas[idea_cursor..idea_cursor + ideas_for_batch].to_vec();
        idea_cursor += ideas_for_batch;

        for _ in 0..num_cells_in_batch {
            let size = participant_blocks[cell_block_cursor];
            cell_block_cursor += 1;
            let cell_participants = participant_ids[participant_cursor..participant_cursor + size].to_vec();
            participant_cursor += size;
            let id = mint.cell();
            cells.push(Cell::new(
                id,
                tier,
                batch_idx as Batch,
                cell_participants,
                batch_ideas.clone(),
                quorum_fraction,
                now,
            ));
        }
    }

    BatchPlan {
        cells,
        is_final_showdown: false,
    }
}

fn div_ceil(a: usize, b: usize) -> usize {
    if b == 0 {
        0
    } else {
        (a + b - 1) / b
    }
}

/// split `total_blocks` participant-size-blocks as evenly as possible
/// across `groups` batches, each batch getting a contiguous run of blocks.
fn split_into_groups(total_blocks: usize, groups: usize) -> Vec<usize> {
    if groups == 0 {
        return Vec::new();
    }
    let base = total_blocks / groups;
    let extra = total_blocks % groups;
    (0..groups)
        .map(|i| base + if i < extra { 1 } else { 0 })
        .map(|n| n.max(1))
        .collect()
}
