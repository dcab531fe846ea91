//! Portable binary encoding of a tournament, for save-to-disk and for the
//! replication protocol's SYNC payload. Uses postcard over serde the way
//! `judo_net` encodes its wire messages, rather than re-deriving a
//! bespoke format for storage alone.

use serde::{Deserialize, Serialize};

use crate::tournament::Tournament;

/// Current on-disk/on-wire format version. Bump when `Tournament`'s
/// serialized shape changes in a way that breaks old readers.
pub const FORMAT_VERSION: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("unsupported format version {found}, expected {expected}")]
    VersionMismatch { found: u16, expected: u16 },
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u16,
    tournament: Tournament,
}

pub fn encode(tournament: &Tournament) -> Result<Vec<u8>, PersistenceError> {
    let envelope = Envelope {
        version: FORMAT_VERSION,
        tournament: tournament.clone(),
    };
    postcard::to_allocvec(&envelope).map_err(|e| PersistenceError::Encode(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<Tournament, PersistenceError> {
    let envelope: Envelope =
        postcard::from_bytes(bytes).map_err(|e| PersistenceError::Decode(e.to_string()))?;
    if envelope.version != FORMAT_VERSION {
        return Err(PersistenceError::VersionMismatch {
            found: envelope.version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(envelope.tournament)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::Tournament;

    #[test]
    fn round_trips_an_empty_tournament() {
        let salt = chrono::Utc::now();
        let id = crate::identifiers::id_from_item(salt, "Kodokan Cup");
        let tournament = Tournament::new(id, "Kodokan Cup".to_string(), salt);
        let bytes = encode(&tournament).expect("encode");
        let restored = decode(&bytes).expect("decode");
        assert_eq!(tournament.name, restored.name);
        assert_eq!(tournament.salt, restored.salt);
    }
}
