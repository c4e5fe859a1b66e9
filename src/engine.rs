//! The engine itself (spec §6.1): the single mutable value that owns every
//! participant, idea, cell, vote slice, and comment for one deliberation,
//! and the sole entry point for every mutating command in the command
//! surface. Grounded on `hosting::Casino`'s shape — one struct holding
//! every piece of mutable state behind simple accessor methods — but with
//! no lock or async boundary: spec §5 serializes every mutation behind
//! `&mut Engine` instead of a `RwLock`, since the engine itself performs
//! no I/O and never suspends.

use crate::cells;
use crate::comments::CommentGraph;
use crate::config::ChampionDefenseMode;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::error::Result;
use crate::events::Event;
use crate::events::EventSink;
use crate::ids::CellId;
use crate::ids::CommentId;
use crate::ids::IdMint;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::model::Cell;
use crate::model::CellStatus;
use crate::model::ChampionRecord;
use crate::model::Comment;
use crate::model::Idea;
use crate::model::IdeaStatus;
use crate::model::OriginalRunStats;
use crate::model::Participant;
use crate::model::ParticipantKind;
use crate::model::VoteSlice;
use crate::projector;
use crate::projector::StateSnapshot;
use crate::rolling::champion::assemble_challengers;
use crate::rolling::champion::AccumulationTimer;
use crate::tiebreak::ByIdeaId;
use crate::tiebreak::TieBreak;
use crate::tiers::advancer;
use crate::tiers::advancer::TierAdvanceOutcome;
use crate::votes;
use crate::votes::timer::TimeoutOutcome;
use crate::votes::Ledger;
use crate::Millis;
use crate::Points;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

/// data-model invariant 6/7: one-way except the two named transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Submission,
    Voting,
    Completed,
    Accumulating,
}

/// what `complete_tier` actually did, for the host to log/broadcast.
#[derive(Debug, Clone)]
pub enum TierCompletionOutcome {
    AdvancedToTier { tier: Tier, idea_ids: Vec<IdeaId> },
    Winner { idea_id: IdeaId },
}

/// mirrors the §6.1 operation table 1:1, minus each operation's `now`
/// (carried alongside it in the log entry instead) so a host's
/// append-only persistence log can store `(Command, Millis)` pairs and
/// replay an entire deliberation through `Engine::apply_now` rather than
/// hand-wiring each operation to its own log format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    AddParticipant { name: String, kind: ParticipantKind },
    AddIdea { text: String, author_id: Option<ParticipantId> },
    SubmitAccumulatedIdea { text: String, author_id: Option<ParticipantId> },
    StartVoting,
    StartCellVoting { cell_id: CellId, timeout_ms: Millis },
    CastVote {
        cell_id: CellId,
        participant_id: ParticipantId,
        allocations: Vec<(IdeaId, Points)>,
    },
    EnableSecondVotes,
    CastSecondVote {
        cell_id: CellId,
        participant_id: ParticipantId,
        allocations: Vec<(IdeaId, Points)>,
    },
    CheckCellTimeout { cell_id: CellId },
    ForceCompleteTierTimeouts { tier: Tier },
    AddComment {
        cell_id: CellId,
        participant_id: ParticipantId,
        text: String,
        linked_idea_id: Option<IdeaId>,
        reply_to: Option<CommentId>,
    },
    UpvoteComment { comment_id: CommentId, participant_id: ParticipantId },
    CompleteTier { tier: Tier },
    CheckAccumulationTimeout,
    TriggerChallenge,
    Reset { preserve_champion: bool },
}

pub struct Engine {
    phase: Phase,
    current_tier: Tier,
    config: EngineConfig,
    mint: IdMint,
    participants: HashMap<ParticipantId, Participant>,
    participant_order: Vec<ParticipantId>,
    ideas: HashMap<IdeaId, Idea>,
    cells: HashMap<CellId, Cell>,
    ledger: Ledger,
    comments: CommentGraph,
    champion: Option<ChampionRecord>,
    /// which tiers were built as a single-batch ("final showdown") round;
    /// `complete_tier` consults this instead of re-deriving it from cell
    /// shape, since Tier-1 cells also happen to all carry `batch == 0`.
    final_showdown_tiers: HashSet<Tier>,
    /// set by `enable_second_votes`; cleared implicitly once the tier
    /// advances (a fresh tier starts with no second-vote window).
    second_votes_enabled_for_tier: Option<Tier>,
    /// the champion idea awaiting insertion into Tier 2, when
    /// `championDefenseMode == SkipToTier2`. Consumed by the Tier-1
    /// `complete_tier` call that builds Tier 2.
    pending_champion_defense: Option<IdeaId>,
    /// how many ideas contested the run in progress, for `championRun`
    /// stats if it ends in a declared winner.
    run_idea_count: usize,
    /// most recent caller-supplied `now`, used for timestamps on
    /// operations (like `declare_winner`) that the command table doesn't
    /// thread a `now` through explicitly.
    clock_now: Millis,
    tie_break: Box<dyn TieBreak + Send + Sync>,
    events: EventSink,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            phase: Phase::Submission,
            current_tier: 0,
            config,
            mint: IdMint::new(),
            participants: HashMap::new(),
            participant_order: Vec::new(),
            ideas: HashMap::new(),
            cells: HashMap::new(),
            ledger: Ledger::new(),
            comments: CommentGraph::new(),
            champion: None,
            final_showdown_tiers: HashSet::new(),
            second_votes_enabled_for_tier: None,
            pending_champion_defense: None,
            run_idea_count: 0,
            clock_now: 0,
            tie_break: Box::new(ByIdeaId),
            events: EventSink::new(),
        }
    }

    pub fn with_tie_break(mut self, tie_break: Box<dyn TieBreak + Send + Sync>) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_tier(&self) -> Tier {
        self.current_tier
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    #[cfg(feature = "host")]
    pub fn subscribe(&mut self) -> tokio::sync::broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    fn require_phase(&self, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::WrongPhase)
        }
    }

    fn idea_mut(&mut self, id: IdeaId) -> Result<&mut Idea> {
        self.ideas.get_mut(&id).ok_or(Error::UnknownIdea { id })
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell> {
        self.cells.get_mut(&id).ok_or(Error::UnknownCell { id })
    }

    // -- submission --

    /// `addParticipant(data)` (spec §6.1): SUBMISSION or ACCUMULATING.
    pub fn add_participant(&mut self, name: String, kind: ParticipantKind, now: Millis) -> Result<Participant> {
        self.require_phase(&[Phase::Submission, Phase::Accumulating])?;
        let id = self.mint.participant();
        let participant = Participant::new(id, name, kind, now);
        self.participants.insert(id, participant.clone());
        self.participant_order.push(id);
        self.events.emit(Event::StateChanged);
        log::info!("participant {id} joined");
        Ok(participant)
    }

    /// `addIdea(data)` (spec §6.1): SUBMISSION only, tier=1.
    pub fn add_idea(&mut self, text: String, author_id: Option<ParticipantId>, now: Millis) -> Result<Idea> {
        self.require_phase(&[Phase::Submission])?;
        if let Some(a) = author_id {
            if !self.participants.contains_key(&a) {
                return Err(Error::UnknownParticipant { id: a });
            }
        }
        let id = self.mint.idea();
        let idea = Idea::new(id, text, author_id, 1, now, false);
        self.ideas.insert(id, idea.clone());
        self.events.emit(Event::StateChanged);
        Ok(idea)
    }

    /// `submitAccumulatedIdea(data)` (spec §6.1): ACCUMULATING only,
    /// tier=0, isNew=true, appended to the sitting champion's challenger
    /// pool.
    pub fn submit_accumulated_idea(
        &mut self,
        text: String,
        author_id: Option<ParticipantId>,
        now: Millis,
    ) -> Result<Idea> {
        self.require_phase(&[Phase::Accumulating])?;
        if let Some(a) = author_id {
            if !self.participants.contains_key(&a) {
                return Err(Error::UnknownParticipant { id: a });
            }
        }
        let id = self.mint.idea();
        let idea = Idea::new(id, text, author_id, 0, now, true);
        self.ideas.insert(id, idea.clone());
        let champion = self.champion.as_mut().expect("phase Accumulating implies champion is set");
        champion.accumulated_ideas.push(id);
        self.events.emit(Event::StateChanged);
        Ok(idea)
    }

    /// `startVoting()` (spec §6.1, §4.2): builds Tier-1 cells from the
    /// current participant and idea rosters.
    pub fn start_voting(&mut self, now: Millis) -> Result<()> {
        self.require_phase(&[Phase::Submission])?;
        self.clock_now = now;
        let n = self.participant_order.len();
        if n < 3 {
            return Err(Error::TooFewParticipants { min: 3, got: n });
        }

        let mut idea_ids: Vec<IdeaId> = self
            .ideas
            .values()
            .filter(|i| i.tier == 1 && Some(i.id) != self.pending_champion_defense)
            .map(|i| i.id)
            .collect();
        idea_ids.sort_unstable();

        let capacity = cells::tier1::capacity(n, self.config.max_ideas_per_cell);
        if idea_ids.len() > capacity {
            return Err(Error::TooManyIdeas {
                capacity,
                participants: n,
                got: idea_ids.len(),
            });
        }

        let built = cells::tier1::build(
            &self.participant_order,
            &idea_ids,
            self.config.max_ideas_per_cell,
            self.config.quorum_fraction,
            &mut self.mint,
            now,
        );
        for cell in &built {
            for &idea_id in &cell.idea_ids {
                self.idea_mut(idea_id)?.status = IdeaStatus::InVoting;
            }
        }
        self.final_showdown_tiers.remove(&1);
        for cell in built {
            self.cells.insert(cell.id, cell);
        }

        self.run_idea_count = idea_ids.len() + if self.pending_champion_defense.is_some() { 1 } else { 0 };
        self.phase = Phase::Voting;
        self.current_tier = 1;
        self.second_votes_enabled_for_tier = None;
        self.events.emit(Event::StateChanged);
        log::info!("tier 1 built: {} cells over {} participants", self.cells.len(), n);
        Ok(())
    }

    /// `startCellVoting(cellId, now, timeoutMs)` (spec §6.1, §4.5).
    pub fn start_cell_voting(&mut self, cell_id: CellId, now: Millis, timeout_ms: Millis) -> Result<()> {
        self.require_phase(&[Phase::Voting])?;
        self.clock_now = now;
        let cell = self.cell_mut(cell_id)?;
        votes::timer::start_voting(cell, now, timeout_ms);
        Ok(())
    }

    // -- voting --

    /// `castVote(cellId, pid, allocations, now)` (spec §6.1, §4.4).
    pub fn cast_vote(
        &mut self,
        cell_id: CellId,
        participant_id: ParticipantId,
        allocations: &[(IdeaId, Points)],
        now: Millis,
    ) -> Result<Vec<VoteSlice>> {
        self.require_phase(&[Phase::Voting])?;
        self.clock_now = now;
        self.validate_member(cell_id, participant_id)?;
        let cell = self.cells.get(&cell_id).ok_or(Error::UnknownCell { id: cell_id })?;
        if !cell.is_open() {
            return Err(Error::CellClosed { id: cell_id });
        }
        let tier = cell.tier;
        let slices = self.ledger.cast(
            cell,
            participant_id,
            allocations,
            self.config.vote_points_per_voter,
            false,
            tier,
            now,
            &mut self.mint,
        )?;
        self.after_vote(cell_id, participant_id, allocations, now)?;
        Ok(slices)
    }

    /// `enableSecondVotes()` (spec §6.1, §4.4): idempotent.
    pub fn enable_second_votes(&mut self) -> Result<()> {
        self.require_phase(&[Phase::Voting])?;
        self.second_votes_enabled_for_tier = Some(self.current_tier);
        Ok(())
    }

    /// `castSecondVote(...)` (spec §6.1, §4.4, §9 Open Question 3): the
    /// participant must already have voted elsewhere this tier, must not
    /// be a regular member of the target cell (else they'd vote normally),
    /// and gets exactly one extra allocation per tier.
    pub fn cast_second_vote(
        &mut self,
        cell_id: CellId,
        participant_id: ParticipantId,
        allocations: &[(IdeaId, Points)],
        now: Millis,
    ) -> Result<Vec<VoteSlice>> {
        self.require_phase(&[Phase::Voting])?;
        self.clock_now = now;
        if !self.participants.contains_key(&participant_id) {
            return Err(Error::UnknownParticipant { id: participant_id });
        }
        let cell = self.cells.get(&cell_id).ok_or(Error::UnknownCell { id: cell_id })?;
        let tier = cell.tier;
        if self.second_votes_enabled_for_tier != Some(tier) {
            return Err(Error::SecondVoteNotAllowed { tier });
        }
        if cell.has_participant(participant_id) {
            return Err(Error::NotAMember {
                participant: participant_id,
                cell: cell_id,
            });
        }
        if self.ledger.used_second_vote(tier, participant_id) {
            return Err(Error::SecondVoteAlreadyUsed {
                participant: participant_id,
                tier,
            });
        }
        let voted_elsewhere = self
            .cells
            .values()
            .filter(|c| c.tier == tier && c.id != cell_id)
            .any(|c| self.ledger.has_voted(c.id, participant_id));
        if !voted_elsewhere {
            return Err(Error::SecondVoteNotAllowed { tier });
        }
        let cell = self.cells.get(&cell_id).expect("checked above");
        let slices = self.ledger.cast(
            cell,
            participant_id,
            allocations,
            self.config.vote_points_per_voter,
            true,
            tier,
            now,
            &mut self.mint,
        )?;
        self.after_vote(cell_id, participant_id, allocations, now)?;
        Ok(slices)
    }

    fn validate_member(&self, cell_id: CellId, participant_id: ParticipantId) -> Result<()> {
        if !self.participants.contains_key(&participant_id) {
            return Err(Error::UnknownParticipant { id: participant_id });
        }
        let cell = self.cells.get(&cell_id).ok_or(Error::UnknownCell { id: cell_id })?;
        if !cell.has_participant(participant_id) {
            return Err(Error::NotAMember {
                participant: participant_id,
                cell: cell_id,
            });
        }
        Ok(())
    }

    /// shared tail of `cast_vote`/`cast_second_vote`: recompute per-idea
    /// totals, advance the finalization timer, and emit `VoteCast`.
    fn after_vote(
        &mut self,
        cell_id: CellId,
        participant_id: ParticipantId,
        allocations: &[(IdeaId, Points)],
        now: Millis,
    ) -> Result<()> {
        for &(idea_id, _) in allocations {
            self.recompute_idea_totals(idea_id);
        }
        let distinct_voters = self.ledger.voters_in_cell(cell_id).len();
        let cell = self.cell_mut(cell_id)?;
        votes::timer::on_vote_cast(cell, distinct_voters, now, self.config.finalizes_after_ms);
        votes::timer::check_finalization(cell, now);
        self.events.emit(Event::VoteCast { cell_id, participant_id });
        self.events.emit(Event::StateChanged);
        Ok(())
    }

    fn recompute_idea_totals(&mut self, idea_id: IdeaId) {
        let cell_ids: Vec<CellId> = self.cells.values().filter(|c| c.has_idea(idea_id)).map(|c| c.id).collect();
        let (points, voters) = self.ledger.idea_tally_across_cells(&cell_ids, idea_id);
        if let Some(idea) = self.ideas.get_mut(&idea_id) {
            idea.total_vote_points = points;
            idea.total_vote_count = voters;
        }
    }

    // -- timers --

    /// `checkCellTimeout(cellId, now)` (spec §6.1, §4.5, §8 idempotent law).
    pub fn check_cell_timeout(&mut self, cell_id: CellId, now: Millis) -> Result<TimeoutOutcome> {
        self.require_phase(&[Phase::Voting])?;
        self.clock_now = now;
        let votes_cast = self.ledger.voters_in_cell(cell_id).len();
        let cell = self.cell_mut(cell_id)?;
        Ok(votes::timer::check_timeout(cell, now, votes_cast))
    }

    /// `forceCompleteTierTimeouts(tier, now)` (spec §6.1): `checkCellTimeout`
    /// over every cell at `tier`.
    pub fn force_complete_tier_timeouts(&mut self, tier: Tier, now: Millis) -> Result<Vec<(CellId, TimeoutOutcome)>> {
        self.require_phase(&[Phase::Voting])?;
        self.clock_now = now;
        let ids: Vec<CellId> = self.cells.values().filter(|c| c.tier == tier).map(|c| c.id).collect();
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let votes_cast = self.ledger.voters_in_cell(id).len();
            let cell = self.cells.get_mut(&id).expect("id came from self.cells");
            outcomes.push((id, votes::timer::check_timeout(cell, now, votes_cast)));
        }
        Ok(outcomes)
    }

    // -- comments --

    /// `addComment(...)` (spec §6.1, §4.7): VOTING or ACCUMULATING. The
    /// cell may belong to an already-completed run's archive when the
    /// engine is accumulating — up-pollination only concerns cells still
    /// in play, but discussion of an archived run is still allowed.
    #[allow(clippy::too_many_arguments)]
    pub fn add_comment(
        &mut self,
        cell_id: CellId,
        participant_id: ParticipantId,
        text: String,
        linked_idea_id: Option<IdeaId>,
        reply_to: Option<CommentId>,
        now: Millis,
    ) -> Result<Comment> {
        self.require_phase(&[Phase::Voting, Phase::Accumulating])?;
        if !self.participants.contains_key(&participant_id) {
            return Err(Error::UnknownParticipant { id: participant_id });
        }
        let cell = self.cells.get(&cell_id).ok_or(Error::UnknownCell { id: cell_id })?;
        let tier = cell.tier;
        if let Some(idea_id) = linked_idea_id {
            if !self.ideas.contains_key(&idea_id) {
                return Err(Error::UnknownIdea { id: idea_id });
            }
        }
        if let Some(reply) = reply_to {
            self.comments.get(reply)?;
        }
        let comment = self
            .comments
            .add(&mut self.mint, cell_id, participant_id, text, linked_idea_id, reply_to, now, tier);
        self.events.emit(Event::CommentAdded {
            cell_id,
            comment_id: comment.id,
        });
        Ok(comment)
    }

    /// `upvoteComment(commentId, pid)` (spec §6.1, §4.7): may trigger
    /// same-batch spread, which happens in the same critical section as
    /// the upvote per spec §5's ordering guarantee.
    pub fn upvote_comment(&mut self, comment_id: CommentId, participant_id: ParticipantId) -> Result<bool> {
        self.require_phase(&[Phase::Voting, Phase::Accumulating])?;
        if !self.participants.contains_key(&participant_id) {
            return Err(Error::UnknownParticipant { id: participant_id });
        }
        let crossed = self
            .comments
            .upvote(comment_id, participant_id, self.config.comment_spread_threshold)?;
        if crossed {
            let comment = self.comments.get(comment_id)?.clone();
            let origin = self.cells.get(&comment.cell_id).ok_or(Error::UnknownCell { id: comment.cell_id })?;
            let (tier, batch) = (origin.tier, origin.batch);
            let peers: Vec<CellId> = self
                .cells
                .values()
                .filter(|c| c.tier == tier && c.batch == batch && c.id != comment.cell_id)
                .filter(|c| match comment.linked_idea_id {
                    Some(idea_id) => c.has_idea(idea_id),
                    None => true,
                })
                .map(|c| c.id)
                .collect();
            self.comments.spread(comment_id, &peers)?;
            self.events.emit(Event::CommentSpread {
                comment_id,
                peer_cells: peers,
            });
        }
        Ok(crossed)
    }

    // -- tier advancement --

    /// `completeTier(tier)` (spec §6.1, §4.6). Requires every cell at
    /// `tier` to already be `Completed` — the host must have force-closed
    /// timed-out-with-quorum cells first via `check_cell_timeout`.
    pub fn complete_tier(&mut self, tier: Tier) -> Result<TierCompletionOutcome> {
        self.require_phase(&[Phase::Voting])?;
        if tier != self.current_tier {
            return Err(Error::TierIncomplete {
                tier,
                cell: CellId::new(0),
            });
        }
        let tier_cells: Vec<Cell> = self.cells.values().filter(|c| c.tier == tier).cloned().collect();
        for cell in &tier_cells {
            if cell.status != CellStatus::Completed {
                return Err(Error::TierIncomplete { tier, cell: cell.id });
            }
        }
        let refs: Vec<&Cell> = tier_cells.iter().collect();

        if tier == 1 {
            self.complete_tier1(&refs)
        } else {
            let is_showdown = self.final_showdown_tiers.contains(&tier);
            self.complete_tier2_plus(&refs, is_showdown)
        }
    }

    fn complete_tier1(&mut self, cells: &[&Cell]) -> Result<TierCompletionOutcome> {
        let outcomes = advancer::advance_tier1(cells, &self.ledger);
        let mut advancing: Vec<IdeaId> = Vec::new();
        for outcome in &outcomes {
            for &id in &outcome.advancing {
                self.idea_mut(id)?.status = IdeaStatus::CellWinner;
                advancing.push(id);
            }
            for &id in &outcome.eliminated {
                self.idea_mut(id)?.status = IdeaStatus::Eliminated;
            }
        }
        if advancing.is_empty() {
            return Err(Error::NoIdeasAdvanced { tier: 1 });
        }
        self.events.emit(Event::TierCompleted { tier: 1 });
        self.finish_advancement(advancing)
    }

    fn complete_tier2_plus(&mut self, cells: &[&Cell], is_final_showdown: bool) -> Result<TierCompletionOutcome> {
        let tier = self.current_tier;
        let ideas = self.ideas.clone();
        let lookup = |id: IdeaId| ideas.get(&id).cloned().expect("idea referenced by a live cell must exist");
        let outcome = advancer::advance_tier2_plus(cells, &self.ledger, self.tie_break.as_ref(), &lookup, is_final_showdown);

        match outcome {
            TierAdvanceOutcome::Winner { idea, eliminated } => {
                self.idea_mut(idea)?.status = IdeaStatus::Winner;
                for id in eliminated {
                    self.idea_mut(id)?.status = IdeaStatus::Eliminated;
                }
                self.events.emit(Event::TierCompleted { tier });
                self.declare_winner(idea)
            }
            TierAdvanceOutcome::BatchWinners(batches) => {
                let mut advancing = Vec::with_capacity(batches.len());
                for batch in batches {
                    self.idea_mut(batch.winner)?.status = IdeaStatus::CellWinner;
                    advancing.push(batch.winner);
                    for id in batch.eliminated {
                        self.idea_mut(id)?.status = IdeaStatus::Eliminated;
                    }
                }
                self.events.emit(Event::TierCompleted { tier });
                if advancing.len() == 1 {
                    self.declare_winner(advancing[0])
                } else {
                    self.finish_advancement(advancing)
                }
            }
        }
    }

    /// build the next tier's cells from the ideas that just advanced, or
    /// declare a winner if only one idea survives.
    fn finish_advancement(&mut self, mut advancing: Vec<IdeaId>) -> Result<TierCompletionOutcome> {
        if let Some(champ) = self.pending_champion_defense.take() {
            advancing.push(champ);
        }
        if advancing.len() == 1 {
            return self.declare_winner(advancing[0]);
        }

        let next_tier = self.current_tier + 1;
        let plan = cells::batching::build(
            &advancing,
            &self.participant_order,
            next_tier,
            self.config.max_ideas_per_cell,
            self.config.target_reduction_ratio,
            self.config.quorum_fraction,
            &mut self.mint,
            self.clock_now,
        );

        let mut idea_to_cells: HashMap<IdeaId, Vec<CellId>> = HashMap::new();
        for cell in &plan.cells {
            for &idea_id in &cell.idea_ids {
                idea_to_cells.entry(idea_id).or_default().push(cell.id);
            }
        }
        for &idea_id in &advancing {
            let idea = self.idea_mut(idea_id)?;
            idea.tier = next_tier;
            idea.status = IdeaStatus::InVoting;
        }
        self.comments.carry_forward(next_tier, &idea_to_cells);

        if plan.is_final_showdown {
            self.final_showdown_tiers.insert(next_tier);
        }
        for cell in plan.cells {
            self.cells.insert(cell.id, cell);
        }
        self.current_tier = next_tier;
        self.second_votes_enabled_for_tier = None;
        self.events.emit(Event::StateChanged);
        log::info!("tier {next_tier} built with {} advancing ideas", advancing.len());
        Ok(TierCompletionOutcome::AdvancedToTier {
            tier: next_tier,
            idea_ids: advancing,
        })
    }

    fn declare_winner(&mut self, idea_id: IdeaId) -> Result<TierCompletionOutcome> {
        self.idea_mut(idea_id)?.status = IdeaStatus::Winner;
        self.events.emit(Event::WinnerDeclared { idea_id });
        if self.config.rolling_mode {
            let recyclable: Vec<IdeaId> = self
                .ideas
                .values()
                .filter(|i| i.tier == self.current_tier && i.status == IdeaStatus::Eliminated)
                .map(|i| i.id)
                .collect();
            let threshold = ChampionRecord::challenge_threshold_for(self.run_idea_count);
            self.champion = Some(ChampionRecord {
                idea_id,
                original_run: OriginalRunStats {
                    idea_count: self.run_idea_count,
                    tier_reached: self.current_tier,
                    completed_at: self.clock_now,
                },
                recyclable_ideas: recyclable,
                accumulated_ideas: Vec::new(),
                accumulation_started_at: self.clock_now,
                accumulation_deadline: self.clock_now + self.config.accumulation_timer_ms,
                challenge_threshold: threshold,
            });
            self.phase = Phase::Accumulating;
            log::info!("idea {idea_id} declared champion; accumulating challengers (threshold {threshold})");
        } else {
            self.phase = Phase::Completed;
            log::info!("idea {idea_id} declared winner");
        }
        self.events.emit(Event::StateChanged);
        Ok(TierCompletionOutcome::Winner { idea_id })
    }

    // -- rolling champion --

    /// `checkAccumulationTimeout(now)` (spec §5, §4.8): a pure reminder
    /// signal for the host; never discards accumulated ideas.
    pub fn check_accumulation_timeout(&mut self, now: Millis) -> Result<bool> {
        self.require_phase(&[Phase::Accumulating])?;
        let champion = self.champion.as_mut().ok_or(Error::NotAccumulating)?;
        Ok(AccumulationTimer::check(champion, now, self.config.accumulation_timer_ms))
    }

    /// `triggerChallenge()` (spec §6.1, §4.8): assembles a fresh contest
    /// from accumulated + recyclable ideas and the champion as a defender,
    /// then returns to SUBMISSION so `startVoting` can build Tier 1 fresh.
    pub fn trigger_challenge(&mut self, now: Millis) -> Result<()> {
        self.require_phase(&[Phase::Accumulating])?;
        let champion = self.champion.take().ok_or(Error::NotAccumulating)?;

        let contest = assemble_challengers(&champion.accumulated_ideas, &champion.recyclable_ideas, champion.challenge_threshold);
        let accumulated_set: HashSet<IdeaId> = champion.accumulated_ideas.iter().copied().collect();
        for &id in &contest {
            let idea = self.idea_mut(id)?;
            idea.tier = 1;
            idea.status = if accumulated_set.contains(&id) {
                IdeaStatus::Submitted
            } else {
                IdeaStatus::Recycled
            };
        }

        let champion_idea = self.idea_mut(champion.idea_id)?;
        champion_idea.is_champion = true;
        match self.config.champion_defense_mode {
            ChampionDefenseMode::SkipToTier2 => {
                champion_idea.tier = 2;
                champion_idea.status = IdeaStatus::Defending;
                self.pending_champion_defense = Some(champion.idea_id);
            }
            ChampionDefenseMode::FromTier1 => {
                champion_idea.tier = 1;
                champion_idea.status = IdeaStatus::Submitted;
                self.pending_champion_defense = None;
            }
        }

        self.events.emit(Event::ChallengeTriggered {
            champion_idea_id: champion.idea_id,
            challenger_count: contest.len(),
        });
        self.phase = Phase::Submission;
        self.current_tier = 0;
        self.clock_now = now;
        self.events.emit(Event::StateChanged);
        log::info!("challenge triggered against champion {}: {} challengers", champion.idea_id, contest.len());
        Ok(())
    }

    // -- lifecycle --

    /// `reset(preserveChampion?)` (spec §6.1, §8 champion-preservation
    /// law): clears the deliberation's participants, ideas, cells, votes,
    /// and comments. When `preserve_champion` is true and a champion is
    /// sitting, it (and its recyclable/accumulated pools) survives and the
    /// engine re-enters ACCUMULATING instead of SUBMISSION.
    pub fn reset(&mut self, preserve_champion: bool) {
        let champion = if preserve_champion { self.champion.take() } else { None };
        *self = Engine::new(self.config.clone());
        if let Some(champion) = champion {
            self.champion = Some(champion);
            self.phase = Phase::Accumulating;
        }
        self.events.emit(Event::StateChanged);
    }

    /// replay one logged `(Command, Millis)` pair through the same entry
    /// point a host's append-only event log uses to rebuild state (§6.4).
    /// Discards each operation's richer return value — a replaying host
    /// only needs to know whether the step succeeded, since the snapshot
    /// it cares about comes from a final `get_state()`.
    pub fn apply_now(&mut self, cmd: Command, now: Millis) -> Result<()> {
        match cmd {
            Command::AddParticipant { name, kind } => {
                self.add_participant(name, kind, now)?;
            }
            Command::AddIdea { text, author_id } => {
                self.add_idea(text, author_id, now)?;
            }
            Command::SubmitAccumulatedIdea { text, author_id } => {
                self.submit_accumulated_idea(text, author_id, now)?;
            }
            Command::StartVoting => {
                self.start_voting(now)?;
            }
            Command::StartCellVoting { cell_id, timeout_ms } => {
                self.start_cell_voting(cell_id, now, timeout_ms)?;
            }
            Command::CastVote { cell_id, participant_id, allocations } => {
                self.cast_vote(cell_id, participant_id, &allocations, now)?;
            }
            Command::EnableSecondVotes => {
                self.enable_second_votes()?;
            }
            Command::CastSecondVote { cell_id, participant_id, allocations } => {
                self.cast_second_vote(cell_id, participant_id, &allocations, now)?;
            }
            Command::CheckCellTimeout { cell_id } => {
                self.check_cell_timeout(cell_id, now)?;
            }
            Command::ForceCompleteTierTimeouts { tier } => {
                self.force_complete_tier_timeouts(tier, now)?;
            }
            Command::AddComment {
                cell_id,
                participant_id,
                text,
                linked_idea_id,
                reply_to,
            } => {
                self.add_comment(cell_id, participant_id, text, linked_idea_id, reply_to, now)?;
            }
            Command::UpvoteComment { comment_id, participant_id } => {
                self.upvote_comment(comment_id, participant_id)?;
            }
            Command::CompleteTier { tier } => {
                self.complete_tier(tier)?;
            }
            Command::CheckAccumulationTimeout => {
                self.check_accumulation_timeout(now)?;
            }
            Command::TriggerChallenge => {
                self.trigger_challenge(now)?;
            }
            Command::Reset { preserve_champion } => {
                self.reset(preserve_champion);
            }
        }
        Ok(())
    }

    /// `getState()` (spec §6.1, §4.9): the sole external-observer contract.
    pub fn get_state(&self) -> StateSnapshot {
        let mut participants: Vec<&Participant> = self.participants.values().collect();
        participants.sort_by_key(|p| p.id);
        let mut ideas: Vec<&Idea> = self.ideas.values().collect();
        ideas.sort_by_key(|i| i.id);
        let mut cells: Vec<&Cell> = self.cells.values().collect();
        cells.sort_by_key(|c| c.id);
        let mut comments = self.comments.all();
        comments.sort_by_key(|c| c.id);

        projector::snapshot(
            self.phase,
            self.current_tier,
            participants.into_iter(),
            ideas.into_iter(),
            cells.into_iter(),
            &self.ledger,
            comments.into_iter(),
            self.champion.as_ref(),
        )
    }
}
