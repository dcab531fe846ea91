//! Error taxonomy.
//!
//! `PreconditionLost` is deliberately absent as an error variant: it is
//! expected no-op semantics under concurrent dispatch, modeled as
//! [`crate::operations::ApplyOutcome::NoOp`] rather than as a failure.

use thiserror::Error;

use crate::identifiers::{CategoryId, MatchId, PlayerId, TatamiId};

/// Recoverable failures an action's `apply` may refuse with. State is left
/// unchanged and nothing is recorded for undo.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("unknown category {0}")]
    UnknownCategory(CategoryId),
    #[error("unknown match {0}")]
    UnknownMatch(MatchId),
    #[error("unknown tatami {0}")]
    UnknownTatami(TatamiId),
    #[error("ruleset tag {0} out of range")]
    RulesetTagOutOfRange(u8),
    #[error("draw tag {0} out of range")]
    DrawTagOutOfRange(u8),
    #[error("concurrent group would exceed MAX_GROUP_COUNT")]
    GroupCapacityExceeded,
    #[error("weight band invalid: {0}")]
    InvalidWeightBand(String),
    #[error("reentrant {0} before matching end")]
    ReentrantBulkOp(&'static str),
    #[error("final block not supported by this draw system")]
    FinalBlockUnsupported,
}

/// A consistency check failed. Fatal: callers should abort the tournament
/// strand and reload from the last good snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("player {player} claims category {category} but category does not list the player back")]
    PlayerCategoryMismatch {
        player: PlayerId,
        category: CategoryId,
    },
    #[error("category {category} counts {{notStarted:{not_started}, started:{started}, finished:{finished}}} disagree with its match list")]
    CategoryCountsMismatch {
        category: CategoryId,
        not_started: usize,
        started: usize,
        finished: usize,
    },
    #[error("block appears in more than one tatami location")]
    DuplicateBlockLocation,
}
