//! The replication protocol: JOIN/SYNC/ACTION/UNDO/QUIT message framing,
//! a per-connection `Session`, and a per-tournament `Gathering` acting as
//! the single master authority participants replicate against.

pub mod error;
pub mod gathering;
pub mod messages;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use judo_core::identifiers::ClientActionId;
use judo_core::tournament::Tournament;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use error::ProtocolError;
use gathering::{Gathering, ParticipantId};
use messages::{Message, MessageBody};

/// Maps published web names to their `Gathering`. A participant loading a
/// not-yet-published name fails to join; loading one already owned joins
/// the existing gathering. Concurrent first-loads for the same name are
/// not coalesced here (left to the storage layer backing `Host::load`);
/// this registry only arbitrates in-memory ownership.
#[derive(Default, Clone)]
pub struct Host {
    gatherings: Arc<Mutex<HashMap<String, Arc<Mutex<Gathering>>>>>,
}

impl Host {
    pub fn new() -> Self {
        Host::default()
    }

    pub async fn publish(&self, web_name: String, tournament: Tournament) -> Result<(), ProtocolError> {
        let mut gatherings = self.gatherings.lock().await;
        if gatherings.contains_key(&web_name) {
            return Err(ProtocolError::WebNameTaken(web_name));
        }
        gatherings.insert(web_name.clone(), Arc::new(Mutex::new(Gathering::new(web_name, tournament))));
        Ok(())
    }

    async fn gathering_for(&self, web_name: &str) -> Result<Arc<Mutex<Gathering>>, ProtocolError> {
        self.gatherings
            .lock()
            .await
            .get(web_name)
            .cloned()
            .ok_or_else(|| ProtocolError::UnknownWebName(web_name.to_string()))
    }

    /// Accepts one connection: reads the JOIN handshake, attaches the
    /// session to the named gathering's onlooker set, then runs the
    /// read/dispatch loop until the peer disconnects or sends QUIT.
    pub async fn accept(&self, mut stream: TcpStream) -> Result<(), ProtocolError> {
        let join = session::read_join(&mut stream).await?;
        let gathering = self.gathering_for(&join.web_name).await?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<Message>();

        let participant: ParticipantId = {
            let mut g = gathering.lock().await;
            g.join(outbound_tx.clone())?
        };

        let dispatch_gathering = gathering.clone();
        tokio::spawn(async move {
            while let Some(message) = inbound_rx.recv().await {
                let mut g = dispatch_gathering.lock().await;
                dispatch(&mut g, participant, message);
            }
            let mut g = dispatch_gathering.lock().await;
            g.quit(participant);
        });

        session::run_session(stream, inbound_tx, outbound_rx).await;
        Ok(())
    }
}

fn dispatch(gathering: &mut Gathering, participant: ParticipantId, message: Message) {
    let client_action_id: ClientActionId = message.id;
    match message.body {
        MessageBody::Action(request) => {
            let action = request.clone().into_action();
            gathering.handle_action(participant, client_action_id, action, request);
        }
        MessageBody::Undo => gathering.handle_undo(participant, client_action_id),
        MessageBody::Quit => {
            info!(participant, "participant quit");
        }
        MessageBody::Join(_) | MessageBody::Sync(_) => {
            // JOIN is only legal once, at handshake time; a mid-session
            // SYNC is master→participant only. Either arriving here is a
            // misbehaving peer; ignore it rather than tearing the
            // connection down.
        }
    }
}
