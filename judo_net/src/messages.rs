//! Wire message shapes, grounded on `squire_sdk::sync::messages`'s
//! `WebSocketMessage<B> { id, body }` envelope, adapted from its
//! multi-phase `SyncChain` negotiation down to the flatter
//! JOIN/SYNC/ACTION/UNDO/QUIT set a single-master-authority protocol
//! needs.

use serde::{Deserialize, Serialize};

use judo_core::identifiers::{CategoryId, ClientActionId, MatchId, PlayerId};
use judo_core::matches::Side;
use judo_core::operations::category_ops::{
    AddCategory, AddPlayersToCategory, AutoAddCategories, ChangeCategoryDrawSystem,
    ChangeCategoryName, ChangeCategoryRuleset, DrawCategory, EraseCategories,
    ErasePlayersFromAllCategories, ErasePlayersFromCategory,
};
use judo_core::operations::match_ops::{AddMatch, MatchEventAction, MatchEventKind, SetMatchPlayer};
use judo_core::operations::player_ops::{AddPlayer, ChangePlayerField, ErasePlayer, PlayerFieldChange};
use judo_core::operations::tatami_ops::{SetTatamiCount, SetTatamiLocation};
use judo_core::operations::Action;
use judo_core::player::PlayerFields;
use judo_core::ruleset::RulesetTag;
use judo_core::tatami::BlockLocation;
use judo_core::draw::DrawTag;
use judo_core::matches::MatchType;

/// A request to perform one of the engine's concrete actions, carrying
/// only constructor parameters rather than the applied `Box<dyn Action>`
/// trait object, matching the role of `Action::fresh_clone` in building
/// an un-applied action for a peer that has not run it yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionRequest {
    AddPlayer {
        id: PlayerId,
        fields: PlayerFields,
    },
    ErasePlayer {
        id: PlayerId,
    },
    ChangePlayerField {
        id: PlayerId,
        change: PlayerFieldChange,
    },
    AddCategory {
        id: CategoryId,
        name: String,
        ruleset_tag: RulesetTag,
        draw_tag: DrawTag,
    },
    EraseCategories {
        ids: Vec<CategoryId>,
    },
    AddPlayersToCategory {
        category: CategoryId,
        players: Vec<PlayerId>,
        seed: u64,
    },
    ErasePlayersFromCategory {
        category: CategoryId,
        players: Vec<PlayerId>,
        seed: u64,
    },
    ErasePlayersFromAllCategories {
        players: Vec<PlayerId>,
        seed: u64,
    },
    DrawCategory {
        category: CategoryId,
        seed: u64,
    },
    ChangeCategoryName {
        category: CategoryId,
        name: String,
    },
    ChangeCategoryRuleset {
        category: CategoryId,
        ruleset_tag: RulesetTag,
        seed: u64,
    },
    ChangeCategoryDrawSystem {
        category: CategoryId,
        draw_tag: DrawTag,
        seed: u64,
    },
    AutoAddCategories {
        players: Vec<PlayerId>,
        base_name: String,
        max_difference_percent: f32,
        max_size: usize,
        ruleset_tag: RulesetTag,
        draw_tag: DrawTag,
        salt: chrono::DateTime<chrono::Utc>,
        seed: u64,
    },
    AddMatch {
        id: MatchId,
        category: CategoryId,
        match_type: MatchType,
        title: String,
        white: Option<PlayerId>,
        blue: Option<PlayerId>,
        bye_eligible: bool,
    },
    SetMatchPlayer {
        category: CategoryId,
        match_id: MatchId,
        side: Side,
        player: Option<PlayerId>,
    },
    MatchEvent {
        category: CategoryId,
        match_id: MatchId,
        kind: MatchEventKind,
        at: chrono::DateTime<chrono::Utc>,
    },
    SetTatamiCount {
        target: usize,
    },
    SetTatamiLocation {
        category: CategoryId,
        match_type: MatchType,
        target: Option<BlockLocation>,
    },
}

impl ActionRequest {
    /// Builds the concrete, un-applied action this request describes.
    pub fn into_action(self) -> Box<dyn Action> {
        match self {
            ActionRequest::AddPlayer { id, fields } => Box::new(AddPlayer::new(id, fields)),
            ActionRequest::ErasePlayer { id } => Box::new(ErasePlayer::new(id)),
            ActionRequest::ChangePlayerField { id, change } => {
                Box::new(ChangePlayerField::new(id, change))
            }
            ActionRequest::AddCategory {
                id,
                name,
                ruleset_tag,
                draw_tag,
            } => Box::new(AddCategory::new(id, name, ruleset_tag, draw_tag)),
            ActionRequest::EraseCategories { ids } => Box::new(EraseCategories::new(ids)),
            ActionRequest::AddPlayersToCategory {
                category,
                players,
                seed,
            } => Box::new(AddPlayersToCategory::new(category, players, seed)),
            ActionRequest::ErasePlayersFromCategory {
                category,
                players,
                seed,
            } => Box::new(ErasePlayersFromCategory::new(category, players, seed)),
            ActionRequest::ErasePlayersFromAllCategories { players, seed } => {
                Box::new(ErasePlayersFromAllCategories::new(players, seed))
            }
            ActionRequest::DrawCategory { category, seed } => {
                Box::new(DrawCategory::new(category, seed))
            }
            ActionRequest::ChangeCategoryName { category, name } => {
                Box::new(ChangeCategoryName::new(category, name))
            }
            ActionRequest::ChangeCategoryRuleset {
                category,
                ruleset_tag,
                seed,
            } => Box::new(ChangeCategoryRuleset::new(category, ruleset_tag, seed)),
            ActionRequest::ChangeCategoryDrawSystem {
                category,
                draw_tag,
                seed,
            } => Box::new(ChangeCategoryDrawSystem::new(category, draw_tag, seed)),
            ActionRequest::AutoAddCategories {
                players,
                base_name,
                max_difference_percent,
                max_size,
                ruleset_tag,
                draw_tag,
                salt,
                seed,
            } => Box::new(AutoAddCategories::new(
                players,
                base_name,
                max_difference_percent,
                max_size,
                ruleset_tag,
                draw_tag,
                salt,
                seed,
            )),
            ActionRequest::AddMatch {
                id,
                category,
                match_type,
                title,
                white,
                blue,
                bye_eligible,
            } => Box::new(AddMatch::with_bye_eligibility(
                id, category, match_type, title, white, blue, bye_eligible,
            )),
            ActionRequest::SetMatchPlayer {
                category,
                match_id,
                side,
                player,
            } => Box::new(SetMatchPlayer::new(category, match_id, side, player)),
            ActionRequest::MatchEvent {
                category,
                match_id,
                kind,
                at,
            } => Box::new(MatchEventAction::new(category, match_id, kind, at)),
            ActionRequest::SetTatamiCount { target } => Box::new(SetTatamiCount::new(target)),
            ActionRequest::SetTatamiLocation {
                category,
                match_type,
                target,
            } => Box::new(SetTatamiLocation::new(category, match_type, target)),
        }
    }
}

/// `JOIN` credentials: a human-readable web name identifying the
/// tournament plus an opaque participant token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub web_name: String,
    pub token: String,
}

/// A full tournament snapshot plus the tail of client actions the
/// snapshot does not yet reflect, sent wholesale on `JOIN` and whenever
/// a participant's optimistic state has diverged from the master's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    pub tournament_bytes: Vec<u8>,
    pub tail: Vec<(ClientActionId, ActionRequest)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageBody {
    Join(JoinRequest),
    Sync(SyncPayload),
    Action(ActionRequest),
    Undo,
    Quit,
}

/// The full envelope exchanged in either direction. `id` carries the
/// dispatching participant's `ClientActionId` for `Action`/`Undo`
/// messages; for `Join`/`Sync`/`Quit` it is a connection-scoped sequence
/// number only used for request/response pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: ClientActionId,
    pub body: MessageBody,
}

fn type_code(body: &MessageBody) -> u16 {
    match body {
        MessageBody::Join(_) => 0,
        MessageBody::Sync(_) => 1,
        MessageBody::Action(_) => 2,
        MessageBody::Undo => 3,
        MessageBody::Quit => 4,
    }
}

impl Message {
    pub fn new(id: ClientActionId, body: MessageBody) -> Self {
        Message { id, body }
    }

    /// `u32 length | u16 type | payload`: the length and type prefix let a
    /// router dispatch (or reject an oversized frame) before the postcard
    /// payload is fully deserialized.
    pub fn encode(&self) -> Result<Vec<u8>, crate::error::ProtocolError> {
        let payload = postcard::to_allocvec(self)
            .map_err(|e| crate::error::ProtocolError::Encode(e.to_string()))?;
        let mut framed = Vec::with_capacity(payload.len() + 6);
        framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        framed.extend_from_slice(&type_code(&self.body).to_be_bytes());
        framed.extend_from_slice(&payload);
        Ok(framed)
    }

    /// Decodes a payload previously produced by [`Message::encode`], given
    /// only the postcard body (the caller has already stripped the
    /// length/type prefix while reading the frame off the wire).
    pub fn decode(payload: &[u8]) -> Result<Self, crate::error::ProtocolError> {
        postcard::from_bytes(payload).map_err(|e| crate::error::ProtocolError::Decode(e.to_string()))
    }
}
