//! Events emitted after each successful mutation (spec §9 design note): the
//! engine isolates itself from I/O by handing hosts a stream of facts
//! instead of calling out to them directly. A host either drains the
//! buffer (`Engine::drain_events`) or, with the `host` feature, subscribes
//! to a live broadcast channel — covering both the mutex-and-poll and the
//! command-queue-and-broadcast embeddings named in spec §5.

use crate::ids::CellId;
use crate::ids::CommentId;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    StateChanged,
    VoteCast {
        cell_id: CellId,
        participant_id: ParticipantId,
    },
    CommentAdded {
        cell_id: CellId,
        comment_id: CommentId,
    },
    CommentSpread {
        comment_id: CommentId,
        peer_cells: Vec<CellId>,
    },
    TierCompleted {
        tier: Tier,
    },
    WinnerDeclared {
        idea_id: IdeaId,
    },
    ChallengeTriggered {
        champion_idea_id: IdeaId,
        challenger_count: usize,
    },
}

/// appends events to an in-memory buffer and, with the `host` feature,
/// fans them out over a `tokio::sync::broadcast` channel. `Engine` owns
/// exactly one of these.
#[derive(Debug, Default)]
pub struct EventSink {
    buffer: Vec<Event>,
    #[cfg(feature = "host")]
    broadcaster: Option<tokio::sync::broadcast::Sender<Event>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, event: Event) {
        #[cfg(feature = "host")]
        if let Some(tx) = &self.broadcaster {
            // a lagging/absent receiver must never block or fail a mutation.
            let _ = tx.send(event.clone());
        }
        self.buffer.push(event);
    }

    /// drain every event recorded since the last drain, in emission order.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.buffer)
    }

    #[cfg(feature = "host")]
    pub fn subscribe(&mut self) -> tokio::sync::broadcast::Receiver<Event> {
        match &self.broadcaster {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = tokio::sync::broadcast::channel(256);
                self.broadcaster = Some(tx);
                rx
            }
        }
    }
}
