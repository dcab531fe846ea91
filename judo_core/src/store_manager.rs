//! Store manager: local dispatch, undo/redo stacks, dirty bit.
//! Grounded on `squire_sdk::sync::manager::TournamentManager`'s
//! `tourn`/`log` pairing, adapted to this crate's pre-image-per-action
//! undo model rather than squire's append-only `OpLog` replay model.

use tracing::{debug, info};

use crate::error::ActionError;
use crate::operations::Action;
use crate::tournament::Tournament;

pub struct StoreManager {
    tournament: Tournament,
    undo_stack: Vec<Box<dyn Action>>,
    redo_stack: Vec<Box<dyn Action>>,
    dirty: bool,
}

impl StoreManager {
    pub fn new(tournament: Tournament) -> Self {
        StoreManager {
            tournament,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            dirty: false,
        }
    }

    pub fn tournament(&self) -> &Tournament {
        &self.tournament
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Applies `action`, pushes it onto the undo stack, and clears redo.
    /// Actions whose apply is a no-op (a `PreconditionLost` precondition) are
    /// still pushed: their `undo` must still pop cleanly so the
    /// undo/redo indices stay consistent, even though it will have no
    /// observable effect.
    pub fn dispatch(&mut self, mut action: Box<dyn Action>) -> Result<(), ActionError> {
        let outcome = action.apply(&mut self.tournament)?;
        info!(tag = ?action.tag(), description = %action.description(), ?outcome, "dispatched");
        self.undo_stack.push(action);
        self.redo_stack.clear();
        self.dirty = true;
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let Some(mut action) = self.undo_stack.pop() else {
            return false;
        };
        action.undo(&mut self.tournament);
        debug!(tag = ?action.tag(), "undone");
        self.redo_stack.push(action);
        self.dirty = true;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(mut action) = self.redo_stack.pop() else {
            return false;
        };
        match action.apply(&mut self.tournament) {
            Ok(outcome) => {
                debug!(tag = ?action.tag(), ?outcome, "replayed");
                self.undo_stack.push(action);
                self.dirty = true;
                true
            }
            Err(err) => {
                tracing::warn!(tag = ?action.tag(), %err, "redo failed, precondition gone");
                false
            }
        }
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
