//! Timers & quorum (spec §4.5). The engine never consults a wall clock on
//! its own — every function here takes `now` from the caller.

use crate::model::Cell;
use crate::model::CellStatus;
use crate::Millis;

/// start a cell's voting window: sets `voting_started_at` and, if
/// `timeout_ms > 0`, a `voting_deadline`. `timeout_ms == 0` means
/// facilitator-driven (no automatic deadline).
pub fn start_voting(cell: &mut Cell, now: Millis, timeout_ms: Millis) {
    cell.voting_started_at = Some(now);
    if timeout_ms > 0 {
        cell.voting_deadline = Some(now + timeout_ms);
    }
}

/// outcome of checking a cell's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// no deadline set, or deadline not yet reached.
    StillOpen,
    /// deadline passed but quorum was not met; cell stays open.
    PastDeadlineBelowQuorum,
    /// deadline passed and quorum was met; cell is force-closed.
    ForceClosed,
    /// cell was already completed (idempotent no-op).
    AlreadyCompleted,
}

/// `checkCellTimeout`: idempotent given the same or later `now`, as long as
/// quorum wasn't met in between (idempotent-timeout law). A cell with zero
/// votes cast is quorum-exempt: rather than sit open forever (nobody will
/// ever reach a quorum nobody started voting toward), it force-closes too,
/// preserving every idea it held on abandonment instead of stalling the
/// tier.
pub fn check_timeout(cell: &mut Cell, now: Millis, votes_cast: usize) -> TimeoutOutcome {
    if cell.status == CellStatus::Completed {
        return TimeoutOutcome::AlreadyCompleted;
    }
    let Some(deadline) = cell.voting_deadline else {
        return TimeoutOutcome::StillOpen;
    };
    if now < deadline {
        return TimeoutOutcome::StillOpen;
    }
    if votes_cast == 0 || votes_cast >= cell.quorum_needed {
        cell.status = CellStatus::Completed;
        cell.completed_by_timeout = true;
        cell.finalizes_at = None;
        TimeoutOutcome::ForceClosed
    } else {
        TimeoutOutcome::PastDeadlineBelowQuorum
    }
}

/// called after every accepted vote: once every member has voted, opens a
/// short grace window (`finalizes_at`) before the cell becomes immutably
/// `Completed`.
pub fn on_vote_cast(cell: &mut Cell, distinct_voters: usize, now: Millis, finalizes_after_ms: Millis) {
    if cell.status == CellStatus::Completed {
        return;
    }
    if distinct_voters >= cell.votes_needed && cell.finalizes_at.is_none() {
        cell.finalizes_at = Some(now + finalizes_after_ms);
        cell.status = CellStatus::Deliberating;
    }
}

/// advance a cell past its grace window once `now` has reached
/// `finalizes_at`. Zero-vote cells with zero members (degenerate, should
/// not occur given the sizer's 3..7 bound) are left untouched.
pub fn check_finalization(cell: &mut Cell, now: Millis) -> bool {
    if cell.status == CellStatus::Completed {
        return false;
    }
    match cell.finalizes_at {
        Some(at) if now >= at => {
            cell.status = CellStatus::Completed;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdMint;

    fn cell(quorum_fraction: f64, members: usize) -> Cell {
        let mut mint = IdMint::new();
        let idea = mint.idea();
        let pids = (0..members).map(|_| mint.participant()).collect();
        Cell::new(mint.cell(), 1, 0, pids, vec![idea], quorum_fraction, 0)
    }

    #[test]
    fn force_close_requires_quorum() {
        let mut c = cell(0.5, 4);
        start_voting(&mut c, 0, 1_000);
        assert_eq!(check_timeout(&mut c, 500, 0), TimeoutOutcome::StillOpen);
        assert_eq!(
            check_timeout(&mut c, 1_000, 1),
            TimeoutOutcome::PastDeadlineBelowQuorum
        );
        assert_eq!(c.status, CellStatus::Voting);
        assert_eq!(check_timeout(&mut c, 1_000, 2), TimeoutOutcome::ForceClosed);
        assert_eq!(c.status, CellStatus::Completed);
    }

    #[test]
    fn zero_vote_cell_is_quorum_exempt_on_timeout() {
        let mut c = cell(0.5, 4);
        start_voting(&mut c, 0, 1_000);
        assert_eq!(check_timeout(&mut c, 999, 0), TimeoutOutcome::StillOpen);
        assert_eq!(check_timeout(&mut c, 1_000, 0), TimeoutOutcome::ForceClosed);
        assert_eq!(c.status, CellStatus::Completed);
        assert!(c.completed_by_timeout);
    }

    #[test]
    fn idempotent_timeout_law() {
        let mut c = cell(0.5, 4);
        start_voting(&mut c, 0, 1_000);
        let first = check_timeout(&mut c, 2_000, 1);
        let snapshot = c.clone();
        let second = check_timeout(&mut c, 3_000, 1);
        assert_eq!(first, second);
        assert_eq!(snapshot, c);
    }

    // -- Idempotent-timeout law (spec §8) -- votes_cast is pinned below
    // quorum and above zero so neither force-close branch fires between
    // the two checks.
    proptest::proptest! {
        #[test]
        fn idempotent_timeout_law_property(
            members in 4usize..50,
            deadline in 1u64..1_000,
            gap in 0u64..1_000,
        ) {
            let mut c = cell(0.9, members);
            start_voting(&mut c, 0, deadline);
            let votes_cast = 1;
            proptest::prop_assume!(votes_cast < c.quorum_needed);
            let t1 = deadline + 1;
            let t2 = t1 + gap;
            let first = check_timeout(&mut c, t1, votes_cast);
            let snapshot = c.clone();
            let second = check_timeout(&mut c, t2, votes_cast);
            proptest::prop_assert_eq!(first, second);
            proptest::prop_assert_eq!(snapshot, c);
        }
    }

    #[test]
    fn grace_window_then_completion() {
        let mut c = cell(0.5, 3);
        start_voting(&mut c, 0, 0);
        on_vote_cast(&mut c, 3, 100, 10_000);
        assert_eq!(c.finalizes_at, Some(10_100));
        assert_eq!(c.status, CellStatus::Deliberating);
        assert!(!check_finalization(&mut c, 10_099));
        assert!(check_finalization(&mut c, 10_100));
        assert_eq!(c.status, CellStatus::Completed);
    }
}
