//! Rolling champion: accumulation phase, threshold-triggered challenge,
//! champion defense seeding (spec §4.8).

pub mod champion;

pub use champion::AccumulationTimer;
