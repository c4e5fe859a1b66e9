use crate::ids::CellId;
use crate::ids::CommentId;
use crate::ids::IdeaId;
use crate::ids::ParticipantId;
use crate::Millis;
use crate::Tier;
use serde::Deserialize;
use serde::Serialize;

/// owned by its origin cell; on up-pollination it becomes visible in peer
/// cells through the state projector, never by duplicating the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub cell_id: CellId,
    pub participant_id: ParticipantId,
    pub text: String,
    pub linked_idea_id: Option<IdeaId>,
    pub reply_to: Option<CommentId>,
    pub created_at: Millis,
    pub upvote_count: u32,
    pub up_pollinated: bool,
    pub source_tier: Tier,
    pub reach_tier: Tier,
    pub spread_count: u32,
}

impl Comment {
    pub(crate) fn new(
        id: CommentId,
        cell_id: CellId,
        participant_id: ParticipantId,
        text: String,
        linked_idea_id: Option<IdeaId>,
        reply_to: Option<CommentId>,
        created_at: Millis,
        tier: Tier,
    ) -> Self {
        Self {
            id,
            cell_id,
            participant_id,
            text,
            linked_idea_id,
            reply_to,
            created_at,
            upvote_count: 0,
            up_pollinated: false,
            source_tier: tier,
            reach_tier: tier,
            spread_count: 0,
        }
    }
}
