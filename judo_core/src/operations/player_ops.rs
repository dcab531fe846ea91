//! `AddPlayer` / `ErasePlayer` / `ChangePlayerField`: straight
//! mutations with pre-image capture, grounded on squire_lib's
//! `PlayerRegistry::add_player`/`drop_player` shape.

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::identifiers::PlayerId;
use crate::operations::{Action, ActionTag, ApplyOutcome};
use crate::player::{Player, PlayerFields};
use crate::tournament::Tournament;

#[derive(Debug, Clone)]
pub struct AddPlayer {
    pub id: PlayerId,
    pub fields: PlayerFields,
    applied: bool,
}

impl AddPlayer {
    pub fn new(id: PlayerId, fields: PlayerFields) -> Self {
        AddPlayer {
            id,
            fields,
            applied: false,
        }
    }
}

impl Action for AddPlayer {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        if tournament.players.contains_key(&self.id) {
            return Ok(ApplyOutcome::NoOp);
        }
        tournament
            .players
            .insert(self.id, Player::new(self.id, self.fields.clone()));
        self.applied = true;
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if self.applied {
            tournament.players.remove(&self.id);
            self.applied = false;
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(AddPlayer::new(self.id, self.fields.clone()))
    }

    fn description(&self) -> String {
        format!("add player {} {}", self.fields.first_name, self.fields.last_name)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::AddPlayer
    }
}

/// Removes a player entirely, disconnecting it from every category and
/// match it was registered in. Pre-image is the full `Player` record plus
/// the set of categories it was removed from (so undo can reattach the
/// reverse-index links exactly).
#[derive(Debug, Clone)]
pub struct ErasePlayer {
    pub id: PlayerId,
    removed: Option<Player>,
}

impl ErasePlayer {
    pub fn new(id: PlayerId) -> Self {
        ErasePlayer { id, removed: None }
    }
}

impl Action for ErasePlayer {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let Some(player) = tournament.players.get(&self.id).cloned() else {
            return Ok(ApplyOutcome::NoOp);
        };
        for category_id in player.categories.iter() {
            if let Some(category) = tournament.categories.get_mut(category_id) {
                category.players.remove(&self.id);
            }
        }
        tournament.players.remove(&self.id);
        self.removed = Some(player);
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if let Some(player) = self.removed.take() {
            for category_id in player.categories.iter() {
                if let Some(category) = tournament.categories.get_mut(category_id) {
                    category.players.insert(player.id);
                }
            }
            tournament.players.insert(player.id, player);
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ErasePlayer::new(self.id))
    }

    fn description(&self) -> String {
        format!("erase player {}", self.id)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ErasePlayer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlayerFieldChange {
    FirstName(String),
    LastName(String),
    Club(Option<String>),
    Weight(Option<f32>),
}

#[derive(Debug, Clone)]
pub struct ChangePlayerField {
    pub id: PlayerId,
    pub change: PlayerFieldChange,
    prior: Option<PlayerFieldChange>,
}

impl ChangePlayerField {
    pub fn new(id: PlayerId, change: PlayerFieldChange) -> Self {
        ChangePlayerField {
            id,
            change,
            prior: None,
        }
    }
}

impl Action for ChangePlayerField {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let player = tournament
            .players
            .get_mut(&self.id)
            .ok_or(ActionError::UnknownPlayer(self.id))?;
        let prior = match &self.change {
            PlayerFieldChange::FirstName(v) => {
                let prior = player.fields.first_name.clone();
                player.fields.first_name = v.clone();
                PlayerFieldChange::FirstName(prior)
            }
            PlayerFieldChange::LastName(v) => {
                let prior = player.fields.last_name.clone();
                player.fields.last_name = v.clone();
                PlayerFieldChange::LastName(prior)
            }
            PlayerFieldChange::Club(v) => {
                let prior = player.fields.club.clone();
                player.fields.club = v.clone();
                PlayerFieldChange::Club(prior)
            }
            PlayerFieldChange::Weight(v) => {
                let prior = player.fields.weight;
                player.fields.weight = *v;
                PlayerFieldChange::Weight(prior)
            }
        };
        self.prior = Some(prior);
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        let Some(prior) = self.prior.take() else {
            return;
        };
        let Some(player) = tournament.players.get_mut(&self.id) else {
            return;
        };
        match prior {
            PlayerFieldChange::FirstName(v) => player.fields.first_name = v,
            PlayerFieldChange::LastName(v) => player.fields.last_name = v,
            PlayerFieldChange::Club(v) => player.fields.club = v,
            PlayerFieldChange::Weight(v) => player.fields.weight = v,
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ChangePlayerField::new(self.id, self.change.clone()))
    }

    fn description(&self) -> String {
        format!("change player {} field", self.id)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ChangePlayerField
    }
}
