//! End-to-end scenarios from spec.md §8, driven entirely through the
//! public command surface (`Engine`) rather than any internal module —
//! these are the tests a host integrator would actually write.

use agora::clock::Clock;
use agora::clock::TestClock;
use agora::config::ChampionDefenseMode;
use agora::engine::Phase;
use agora::engine::TierCompletionOutcome;
use agora::model::IdeaStatus;
use agora::model::ParticipantKind;
use agora::Engine;
use agora::EngineConfig;

fn seed(engine: &mut Engine, participants: usize, ideas: usize, clock: &TestClock) -> Vec<String> {
    for i in 0..participants {
        engine
            .add_participant(format!("participant-{i}"), ParticipantKind::Human, clock.now())
            .unwrap();
    }
    let mut texts = Vec::with_capacity(ideas);
    for i in 0..ideas {
        let text = format!("idea-{i}");
        engine.add_idea(text.clone(), None, clock.now()).unwrap();
        texts.push(text);
    }
    texts
}

fn vote_first_idea_in_every_cell(engine: &mut Engine, tier: u32, clock: &TestClock) {
    let snapshot = engine.get_state();
    for cell in snapshot.cells.iter().filter(|c| c.tier == tier) {
        let winner = cell.idea_ids[0];
        for &pid in &cell.participant_ids {
            engine.cast_vote(cell.id, pid, &[(winner, 10)], clock.now()).unwrap();
        }
    }
}

#[test]
fn s1_twenty_five_participants_twenty_five_ideas_normal_reduction() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(EngineConfig::new());
    seed(&mut engine, 25, 25, &clock);

    engine.start_voting(clock.now()).unwrap();
    let snapshot = engine.get_state();
    assert_eq!(snapshot.cells.len(), 5);
    for cell in &snapshot.cells {
        assert_eq!(cell.participant_ids.len(), 5);
        assert_eq!(cell.idea_ids.len(), 5);
    }

    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 1, &clock);
    let outcome = engine.complete_tier(1).unwrap();
    let advancing = match outcome {
        TierCompletionOutcome::AdvancedToTier { tier, idea_ids } => {
            assert_eq!(tier, 2);
            idea_ids
        }
        TierCompletionOutcome::Winner { .. } => panic!("tier 1 with 5 disjoint cells must not collapse directly"),
    };
    assert_eq!(advancing.len(), 5);

    let snapshot = engine.get_state();
    let tier2_cells: Vec<_> = snapshot.cells.iter().filter(|c| c.tier == 2).collect();
    assert_eq!(tier2_cells.len(), 5);
    for cell in &tier2_cells {
        assert_eq!(cell.idea_ids.len(), 5);
    }

    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 2, &clock);
    let outcome = engine.complete_tier(2).unwrap();
    match outcome {
        TierCompletionOutcome::Winner { idea_id } => assert_eq!(idea_id, advancing[0]),
        other => panic!("expected a declared winner, got {other:?}"),
    }
    assert_eq!(engine.phase(), Phase::Completed);
}

#[test]
fn s2_thirty_eight_participants_edge_remainder() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(EngineConfig::new());
    seed(&mut engine, 38, 38, &clock);
    engine.start_voting(clock.now()).unwrap();

    let snapshot = engine.get_state();
    assert_eq!(snapshot.cells.len(), 8);
    let covered: usize = snapshot.cells.iter().map(|c| c.participant_ids.len()).sum();
    assert_eq!(covered, 38);
    let sizes: Vec<usize> = snapshot.cells.iter().map(|c| c.participant_ids.len()).collect();
    let mut sorted = sizes.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![3, 5, 5, 5, 5, 5, 5, 5]);
}

#[test]
fn s3_tie_at_tier1_both_ideas_advance() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(EngineConfig::new());
    seed(&mut engine, 5, 3, &clock);
    engine.start_voting(clock.now()).unwrap();

    let snapshot = engine.get_state();
    let cell = &snapshot.cells[0];
    let ideas = cell.idea_ids.clone();
    let pids = cell.participant_ids.clone();

    clock.advance(1);
    engine.cast_vote(cell.id, pids[0], &[(ideas[0], 10)], clock.now()).unwrap();
    engine.cast_vote(cell.id, pids[1], &[(ideas[0], 10)], clock.now()).unwrap();
    engine.cast_vote(cell.id, pids[2], &[(ideas[1], 10)], clock.now()).unwrap();
    engine.cast_vote(cell.id, pids[3], &[(ideas[1], 10)], clock.now()).unwrap();
    engine.cast_vote(cell.id, pids[4], &[(ideas[2], 10)], clock.now()).unwrap();

    let outcome = engine.complete_tier(1).unwrap();
    match outcome {
        TierCompletionOutcome::Winner { .. } => panic!("two ideas tie, neither should be a lone winner"),
        TierCompletionOutcome::AdvancedToTier { idea_ids, .. } => {
            assert_eq!(idea_ids.len(), 2);
            assert!(idea_ids.contains(&ideas[0]));
            assert!(idea_ids.contains(&ideas[1]));
        }
    }
    let state = engine.get_state();
    let third = state.ideas.iter().find(|i| i.id == ideas[2]).unwrap();
    assert_eq!(third.status, IdeaStatus::Eliminated);
}

#[test]
fn s4_abandoned_cell_force_closes_quorum_exempt_and_all_ideas_advance() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(EngineConfig::new());
    seed(&mut engine, 10, 6, &clock);
    engine.start_voting(clock.now()).unwrap();

    let snapshot = engine.get_state();
    let abandoned = snapshot.cells[0].clone();
    let other_cell = snapshot.cells[1].clone();
    assert_eq!(abandoned.quorum_needed, 3);
    engine.start_cell_voting(abandoned.id, clock.now(), 1_000).unwrap();
    engine.start_cell_voting(other_cell.id, clock.now(), 1_000).unwrap();

    // no votes are ever cast in `abandoned` — everyone votes in the other
    // cell instead, leaving it genuinely zero-vote rather than just
    // under quorum.
    clock.advance(500);
    let other_winner = other_cell.idea_ids[0];
    for &pid in &other_cell.participant_ids {
        engine.cast_vote(other_cell.id, pid, &[(other_winner, 10)], clock.now()).unwrap();
    }

    clock.advance(500);
    let outcome = engine.check_cell_timeout(abandoned.id, clock.now()).unwrap();
    assert_eq!(outcome, agora::votes::timer::TimeoutOutcome::ForceClosed);

    let mid_state = engine.get_state();
    let closed_cell = mid_state.cells.iter().find(|c| c.id == abandoned.id).unwrap();
    assert_eq!(closed_cell.status, agora::model::CellStatus::Completed);

    // the other_cell cast 3 votes immediately, so it already closed via
    // on_vote_cast + the grace window rather than the timeout path.
    engine.check_cell_timeout(other_cell.id, clock.now()).unwrap();

    let tier_outcome = engine.complete_tier(1).unwrap();
    match tier_outcome {
        TierCompletionOutcome::AdvancedToTier { idea_ids, .. } => {
            for &idea_id in &abandoned.idea_ids {
                assert!(idea_ids.contains(&idea_id), "every idea in the abandoned cell must still advance");
            }
        }
        TierCompletionOutcome::Winner { .. } => panic!("two surviving cells cannot collapse to a single winner"),
    }
    let final_state = engine.get_state();
    for &idea_id in &abandoned.idea_ids {
        let idea = final_state.ideas.iter().find(|i| i.id == idea_id).unwrap();
        assert_ne!(idea.status, IdeaStatus::Eliminated, "abandonment must not cost an idea its place");
    }
}

#[test]
fn s5_comment_spread_crosses_threshold_and_reaches_peer_cells() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(EngineConfig::new().with_comment_spread_threshold(2));
    seed(&mut engine, 12, 12, &clock);
    engine.start_voting(clock.now()).unwrap();

    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 1, &clock);
    engine.complete_tier(1).unwrap();

    let snapshot = engine.get_state();
    let batch0: Vec<_> = snapshot.cells.iter().filter(|c| c.tier == 2 && c.batch == 0).collect();
    assert!(batch0.len() >= 2);
    let origin = batch0[0];
    let peer = batch0[1];
    let voters = origin.participant_ids.clone();

    clock.advance(1);
    let comment = engine
        .add_comment(origin.id, voters[0], "strong idea here".into(), None, None, clock.now())
        .unwrap();
    assert!(!engine.upvote_comment(comment.id, voters[1]).unwrap());
    assert!(engine.upvote_comment(comment.id, voters[2]).unwrap());

    let state = engine.get_state();
    let stored = state.comments.iter().find(|c| c.id == comment.id).unwrap();
    assert_eq!(stored.upvote_count, 2);
    assert!(stored.up_pollinated);
    assert!(stored.spread_count >= 1);

    assert!(!engine.upvote_comment(comment.id, voters[3]).unwrap());
    let state = engine.get_state();
    let stored = state.comments.iter().find(|c| c.id == comment.id).unwrap();
    assert_eq!(stored.upvote_count, 3, "upvotes must stay monotonic after spread");
    let _ = peer;
}

#[test]
fn s6_rolling_challenge_seeds_champion_as_tier2_defender() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(EngineConfig::new().with_rolling_mode(true));
    seed(&mut engine, 25, 25, &clock);
    engine.start_voting(clock.now()).unwrap();

    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 1, &clock);
    let tier1 = engine.complete_tier(1).unwrap();
    let advancing = match tier1 {
        TierCompletionOutcome::AdvancedToTier { idea_ids, .. } => idea_ids,
        _ => panic!("expected tier 2"),
    };

    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 2, &clock);
    let tier2 = engine.complete_tier(2).unwrap();
    let champion_id = match tier2 {
        TierCompletionOutcome::Winner { idea_id } => idea_id,
        _ => panic!("expected a declared winner"),
    };
    let _ = advancing;

    assert_eq!(engine.phase(), Phase::Accumulating);
    let state = engine.get_state();
    let status = state.accumulation_status.expect("accumulating run has accumulation status");
    assert_eq!(status.threshold, 13);

    clock.advance(1);
    for i in 0..13 {
        engine
            .submit_accumulated_idea(format!("challenger-{i}"), None, clock.now())
            .unwrap();
    }

    clock.advance(1);
    engine.trigger_challenge(clock.now()).unwrap();
    assert_eq!(engine.phase(), Phase::Submission);

    let state = engine.get_state();
    let champion_idea = state.ideas.iter().find(|i| i.id == champion_id).unwrap();
    assert_eq!(champion_idea.status, IdeaStatus::Defending);
    assert_eq!(champion_idea.tier, 2);

    clock.advance(1);
    engine.start_voting(clock.now()).unwrap();
    assert_eq!(engine.current_tier(), 1);
    let state = engine.get_state();
    assert!(
        !state.cells.iter().any(|c| c.idea_ids.contains(&champion_id)),
        "skip-to-tier-2 champion must not appear in Tier 1 cells"
    );
}

#[test]
fn champion_defense_mode_from_tier1_rejoins_the_open_field() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(
        EngineConfig::new()
            .with_rolling_mode(true)
            .with_champion_defense_mode(ChampionDefenseMode::FromTier1),
    );
    seed(&mut engine, 25, 25, &clock);
    engine.start_voting(clock.now()).unwrap();
    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 1, &clock);
    engine.complete_tier(1).unwrap();
    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 2, &clock);
    let champion_id = match engine.complete_tier(2).unwrap() {
        TierCompletionOutcome::Winner { idea_id } => idea_id,
        _ => panic!("expected a declared winner"),
    };

    clock.advance(1);
    for i in 0..13 {
        engine
            .submit_accumulated_idea(format!("challenger-{i}"), None, clock.now())
            .unwrap();
    }
    clock.advance(1);
    engine.trigger_challenge(clock.now()).unwrap();

    clock.advance(1);
    engine.start_voting(clock.now()).unwrap();
    let state = engine.get_state();
    assert!(
        state.cells.iter().any(|c| c.idea_ids.contains(&champion_id)),
        "fromTier1 mode must make the champion re-win Tier 1 like any other idea"
    );
}

#[test]
fn reset_preserves_champion_and_recyclable_ideas() {
    let clock = TestClock::new(0);
    let mut engine = Engine::new(EngineConfig::new().with_rolling_mode(true));
    seed(&mut engine, 5, 5, &clock);
    engine.start_voting(clock.now()).unwrap();
    clock.advance(1);
    vote_first_idea_in_every_cell(&mut engine, 1, &clock);
    engine.complete_tier(1).unwrap();
    assert_eq!(engine.phase(), Phase::Accumulating);

    let before = engine.get_state();
    let champion_before = before.champion.clone().unwrap();

    engine.reset(true);
    assert_eq!(engine.phase(), Phase::Accumulating);
    let after = engine.get_state();
    let champion_after = after.champion.unwrap();
    assert_eq!(champion_after.idea_id, champion_before.idea_id);
    assert_eq!(champion_after.recyclable_ideas, champion_before.recyclable_ideas);
}
