//! Core judo tournament engine: entities, rulesets, draw systems, tatami
//! layout, and the action/undo log that mutates them.

pub mod category;
pub mod draw;
pub mod error;
pub mod identifiers;
pub mod matches;
pub mod operations;
pub mod persistence;
pub mod player;
pub mod ruleset;
pub mod store_manager;
pub mod tatami;
pub mod tournament;

pub use error::{ActionError, InvariantViolation};
pub use identifiers::{CategoryId, ClientActionId, Id, MatchId, PlayerId, TatamiId, TournamentId};
pub use store_manager::StoreManager;
pub use tournament::{ChangeEvent, Tournament};
