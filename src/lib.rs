//! Agora — a tournament-style group deliberation engine.
//!
//! Participants are partitioned into small discussion cells, allocate vote
//! points across the ideas visible to them, and surviving ideas advance
//! tier by tier until a single winner is declared. The engine owns no I/O:
//! every time-sensitive operation takes its `now` from the caller, and every
//! mutation is serialized behind `&mut Engine`. See `DESIGN.md` for the
//! grounding of each module against the prior art it was built from.

pub mod clock;
pub mod comments;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ids;
pub mod model;
pub mod projector;
pub mod rolling;
pub mod sizer;
pub mod tiebreak;
pub mod tiers;
pub mod votes;

pub mod cells {
    pub mod batching;
    pub mod tier1;
}

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::Error;
pub use error::Result;

/// vote points every participant allocates per cell, per ballot.
pub type Points = u32;
/// one-indexed tournament round.
pub type Tier = u32;
/// batch index within a tier (Tier-2+ only).
pub type Batch = u32;
/// caller-supplied monotonic milliseconds since an arbitrary epoch.
pub type Millis = u64;

/// minimum and maximum cell size the sizer may produce.
pub const CELL_MIN: usize = 3;
pub const CELL_MAX: usize = 7;

/// initialize logging for a process that embeds the engine as `main`: a
/// combined terminal + file logger, gated so a host that already owns its
/// own logging setup never has to pull in `simplelog`/`env_logger` at all.
#[cfg(feature = "host")]
pub fn init_logging() {
    use simplelog::ColorChoice;
    use simplelog::CombinedLogger;
    use simplelog::Config;
    use simplelog::LevelFilter;
    use simplelog::TermLogger;
    use simplelog::TerminalMode;
    let _ = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
