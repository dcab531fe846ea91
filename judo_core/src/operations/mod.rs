//! The action log & reducer: a closed, tagged sum of concrete action
//! kinds plus a single `Action` trait, mirroring the closed-dispatch shape
//! of `squire_lib::operations::TournOp` rather than open inheritance.

pub mod category_ops;
pub mod composite;
pub mod match_ops;
pub mod player_ops;
pub mod tatami_ops;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::tournament::Tournament;

/// A stable, persistable tag naming which concrete action kind an
/// `Action` trait object is, used by the on-disk/wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTag {
    AddPlayer,
    ErasePlayer,
    ChangePlayerField,
    AddCategory,
    EraseCategories,
    AddPlayersToCategory,
    ErasePlayersFromCategory,
    ErasePlayersFromAllCategories,
    DrawCategory,
    AddMatch,
    SetMatchPlayer,
    MatchResume,
    MatchPause,
    MatchAwardIppon,
    MatchAwardWazari,
    MatchAwardShido,
    MatchAwardHansokuMake,
    SetTatamiCount,
    SetTatamiLocation,
    ChangeCategoryName,
    ChangeCategoryRuleset,
    ChangeCategoryDrawSystem,
    AutoAddCategories,
}

/// Whether an apply actually mutated state. A `NoOp` is the expected
/// result of `PreconditionLost`: the action stays on the log so
/// undo/redo indices remain consistent, but has no observable effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    NoOp,
}

/// An atomic, reversible mutation. `apply` captures whatever pre-image it
/// needs inside `self`; `undo` consumes it. Composite actions hold an
/// internal stack of child actions applied in order, undone in reverse
///.
pub trait Action: Send {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError>;

    /// Reverses a previously successful `apply`. A no-op if the action
    /// was never applied or its precondition has since evaporated.
    fn undo(&mut self, tournament: &mut Tournament);

    /// A fresh, un-applied copy with no pre-image captured — used to
    /// replicate an action to a remote peer before it has run there.
    fn fresh_clone(&self) -> Box<dyn Action>;

    fn description(&self) -> String;

    fn tag(&self) -> ActionTag;
}

/// Undoes a stack of child actions LIFO, as every composite/cascading
/// action in this crate does with its own children.
pub(crate) fn undo_children(children: &mut Vec<Box<dyn Action>>, tournament: &mut Tournament) {
    while let Some(mut child) = children.pop() {
        child.undo(tournament);
    }
}
