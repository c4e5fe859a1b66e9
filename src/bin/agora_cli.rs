//! Demonstration binary exercising the full command surface against an
//! in-memory deliberation: add a roster of participants and ideas, build
//! Tier 1, auto-vote every cell for its first idea, and advance tiers
//! until a winner is declared (or the champion enters ACCUMULATING).
//! A thin wrapper that wires logging, parses a handful of flags, and hands
//! off to the library crate.

use agora::config::ChampionDefenseMode;
use agora::model::ParticipantKind;
use agora::Engine;
use agora::EngineConfig;
use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agora-cli", about = "Run a toy deliberation and print the final state")]
struct Args {
    /// number of participants to seed.
    #[arg(long, default_value_t = 25)]
    participants: usize,

    /// number of ideas to seed.
    #[arg(long, default_value_t = 25)]
    ideas: usize,

    /// enable rolling-champion mode once a winner is declared.
    #[arg(long)]
    rolling: bool,

    /// require the champion to re-win Tier 1 on its next defense,
    /// instead of the default skip-to-Tier-2 advantage.
    #[arg(long)]
    champion_from_tier1: bool,
}

fn main() -> Result<()> {
    agora::init_logging();
    let args = Args::parse();

    let mut config = EngineConfig::new().with_rolling_mode(args.rolling);
    if args.champion_from_tier1 {
        config = config.with_champion_defense_mode(ChampionDefenseMode::FromTier1);
    }
    let mut engine = Engine::new(config);

    for i in 0..args.participants {
        engine.add_participant(format!("participant-{i}"), ParticipantKind::Human, 0)?;
    }
    for i in 0..args.ideas {
        engine.add_idea(format!("idea #{i}"), None, 0)?;
    }

    engine.start_voting(0)?;
    log::info!("tier 1 built");

    let mut now: u64 = 1;
    loop {
        let snapshot = engine.get_state();
        let tier = snapshot.current_tier;
        let tier_cells: Vec<_> = snapshot.cells.iter().filter(|c| c.tier == tier).cloned().collect();
        for cell in &tier_cells {
            let winner = cell.idea_ids[0];
            for &pid in &cell.participant_ids {
                engine.cast_vote(cell.id, pid, &[(winner, 10)], now)?;
            }
        }
        now += 1;
        let outcome = engine.complete_tier(tier)?;
        match outcome {
            agora::engine::TierCompletionOutcome::AdvancedToTier { tier, idea_ids } => {
                log::info!("tier {tier} built with {} advancing ideas", idea_ids.len());
            }
            agora::engine::TierCompletionOutcome::Winner { idea_id } => {
                log::info!("winner declared: {idea_id}");
                break;
            }
        }
    }

    let state = engine.get_state();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
