//! The `Gathering` actor: one per published tournament, the single
//! master authority every connected participant replicates against.
//! Grounded on `squire_sdk::server::gathering`'s `onlookers: HashMap<AuthUser,
//! Onlooker>` plus broadcast-except-sender shape, simplified from its
//! peer-merge model down to this protocol's single-writer model: the
//! master re-applies a participant's action on top of its own state and
//! SYNCs the participant back on precondition failure.

use std::collections::HashMap;

use judo_core::identifiers::ClientActionId;
use judo_core::store_manager::StoreManager;
use judo_core::tournament::Tournament;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::ProtocolError;
use crate::messages::{Message, MessageBody, SyncPayload};

pub type ParticipantId = u64;

struct Onlooker {
    outbox: mpsc::UnboundedSender<Message>,
    /// Ids this participant has already had applied, for ACTION/UNDO
    /// idempotence and at-least-once broadcast dedup.
    seen: std::collections::HashSet<ClientActionId>,
}

pub struct Gathering {
    pub web_name: String,
    store: StoreManager,
    onlookers: HashMap<ParticipantId, Onlooker>,
    next_participant: ParticipantId,
}

impl Gathering {
    pub fn new(web_name: String, tournament: Tournament) -> Self {
        Gathering {
            web_name,
            store: StoreManager::new(tournament),
            onlookers: HashMap::new(),
            next_participant: 0,
        }
    }

    pub fn join(&mut self, outbox: mpsc::UnboundedSender<Message>) -> Result<ParticipantId, ProtocolError> {
        let id = self.next_participant;
        self.next_participant += 1;
        let sync = self.full_sync();
        outbox
            .send(Message::new(ClientActionId(0), MessageBody::Sync(sync)))
            .map_err(|_| ProtocolError::SessionClosed)?;
        self.onlookers.insert(
            id,
            Onlooker {
                outbox,
                seen: std::collections::HashSet::new(),
            },
        );
        info!(participant = id, web_name = %self.web_name, "joined gathering");
        Ok(id)
    }

    pub fn quit(&mut self, participant: ParticipantId) {
        self.onlookers.remove(&participant);
        info!(participant, web_name = %self.web_name, "left gathering");
    }

    fn full_sync(&self) -> SyncPayload {
        let bytes = judo_core::persistence::encode(self.store.tournament())
            .expect("in-memory tournament always encodes");
        SyncPayload {
            tournament_bytes: bytes,
            tail: Vec::new(),
        }
    }

    /// Applies a participant's action atop master state. On success,
    /// broadcasts it to every other onlooker (at-least-once, deduped by
    /// `client_action_id`) and confirms the sender with a no-op echo. On
    /// a lost precondition, SYNCs only the failing participant.
    pub fn handle_action(
        &mut self,
        participant: ParticipantId,
        client_action_id: ClientActionId,
        action: Box<dyn judo_core::operations::Action>,
        request: crate::messages::ActionRequest,
    ) {
        if let Some(onlooker) = self.onlookers.get(&participant) {
            if onlooker.seen.contains(&client_action_id) {
                return;
            }
        }

        let mut action = action;
        let description = action.description();
        match self.store.dispatch(action) {
            Ok(()) => {
                if let Some(onlooker) = self.onlookers.get_mut(&participant) {
                    onlooker.seen.insert(client_action_id);
                }
                info!(participant, %description, "action applied, broadcasting");
                self.broadcast_except(
                    participant,
                    Message::new(client_action_id, MessageBody::Action(request)),
                );
            }
            Err(err) => {
                warn!(participant, %err, "precondition lost, resyncing participant");
                if let Some(onlooker) = self.onlookers.get(&participant) {
                    let sync = self.full_sync();
                    let _ = onlooker
                        .outbox
                        .send(Message::new(client_action_id, MessageBody::Sync(sync)));
                }
            }
        }
    }

    pub fn handle_undo(&mut self, participant: ParticipantId, client_action_id: ClientActionId) {
        if self.store.undo() {
            self.broadcast_except(participant, Message::new(client_action_id, MessageBody::Undo));
        }
    }

    fn broadcast_except(&self, sender: ParticipantId, message: Message) {
        for (id, onlooker) in self.onlookers.iter() {
            if *id == sender {
                continue;
            }
            let _ = onlooker.outbox.send(message.clone());
        }
    }

    pub fn participant_count(&self) -> usize {
        self.onlookers.len()
    }
}
