//! Vote ledger and cell timers/quorum (spec §4.4, §4.5).

pub mod ledger;
pub mod timer;

pub use ledger::Ledger;
