//! The tournament store: the aggregate state plus paired
//! bulk-operation hooks and change notifiers. Mutating methods here are
//! only legal from inside an action's `apply`/`undo` — enforced by
//! convention (only `operations::*` calls them), the same discipline
//! `squire_lib::tournament::Tournament::apply_op` uses for its private
//! mutator methods.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::ActionError;
use crate::identifiers::{CategoryId, MatchId, PlayerId, TournamentId};
use crate::matches::Match;
use crate::player::Player;
use crate::tatami::TatamiList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkScope {
    AddPlayers,
    ErasePlayers,
    ResetMatches,
    AddTatamis,
    EraseTatamis,
}

/// Fired in pairs around bulk operations and after individual
/// notification-worthy mutations, matching `squire_lib`'s direct-call
/// subscriber pattern rather than introducing a separate event-bus crate.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    PlayersChanged,
    CategoriesChanged,
    MatchesChanged {
        category: CategoryId,
        matches: Vec<MatchId>,
    },
    TatamisChanged,
}

#[derive(Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub salt: DateTime<Utc>,
    pub players: HashMap<PlayerId, Player>,
    pub categories: HashMap<CategoryId, Category>,
    /// Flat table keyed by id; each category's `matches` field holds the
    /// ordering, mirroring `squire_lib::round_registry` keeping
    /// `rounds: HashMap<u64, Round>` distinct from its ordering index.
    pub matches: HashMap<MatchId, Match>,
    pub tatamis: TatamiList,

    #[serde(skip)]
    active_scope: Option<BulkScope>,
    #[serde(skip)]
    listeners: Vec<Box<dyn Fn(&ChangeEvent) + Send + Sync>>,
}

impl Clone for Tournament {
    fn clone(&self) -> Self {
        Tournament {
            id: self.id,
            name: self.name.clone(),
            salt: self.salt,
            players: self.players.clone(),
            categories: self.categories.clone(),
            matches: self.matches.clone(),
            tatamis: self.tatamis.clone(),
            active_scope: None,
            listeners: Vec::new(),
        }
    }
}

impl Tournament {
    pub fn new(id: TournamentId, name: String, salt: DateTime<Utc>) -> Self {
        Tournament {
            id,
            name,
            salt,
            players: HashMap::new(),
            categories: HashMap::new(),
            matches: HashMap::new(),
            tatamis: TatamiList::default(),
            active_scope: None,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ChangeEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    fn notify(&self, event: ChangeEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    pub fn notify_players_changed(&self) {
        self.notify(ChangeEvent::PlayersChanged);
    }

    pub fn notify_categories_changed(&self) {
        self.notify(ChangeEvent::CategoriesChanged);
    }

    pub fn notify_matches_changed(&self, category: CategoryId, matches: Vec<MatchId>) {
        self.notify(ChangeEvent::MatchesChanged { category, matches });
    }

    pub fn notify_tatamis_changed(&self) {
        self.notify(ChangeEvent::TatamisChanged);
    }

    fn begin_scope(&mut self, scope: BulkScope, name: &'static str) -> Result<(), ActionError> {
        match self.active_scope {
            None => {
                self.active_scope = Some(scope);
                Ok(())
            }
            // A reset-matches scope silently swallows a nested begin/end
            // pair of the same kind: a re-entrancy carve-out.
            Some(BulkScope::ResetMatches) if scope == BulkScope::ResetMatches => Ok(()),
            Some(_) => Err(ActionError::ReentrantBulkOp(name)),
        }
    }

    fn end_scope(&mut self, scope: BulkScope) {
        if self.active_scope == Some(scope) {
            self.active_scope = None;
        }
    }

    pub fn begin_add_players(&mut self) -> Result<(), ActionError> {
        self.begin_scope(BulkScope::AddPlayers, "beginAddPlayers")
    }
    pub fn end_add_players(&mut self) {
        self.end_scope(BulkScope::AddPlayers);
        self.notify_players_changed();
    }

    pub fn begin_erase_players(&mut self) -> Result<(), ActionError> {
        self.begin_scope(BulkScope::ErasePlayers, "beginErasePlayers")
    }
    pub fn end_erase_players(&mut self) {
        self.end_scope(BulkScope::ErasePlayers);
        self.notify_players_changed();
    }

    pub fn begin_reset_matches(&mut self, _category: CategoryId) -> Result<(), ActionError> {
        self.begin_scope(BulkScope::ResetMatches, "beginResetMatches")
    }
    pub fn end_reset_matches(&mut self, category: CategoryId) {
        self.end_scope(BulkScope::ResetMatches);
        let matches = self
            .categories
            .get(&category)
            .map(|c| c.matches.clone())
            .unwrap_or_default();
        self.notify_matches_changed(category, matches);
    }

    pub fn begin_add_tatamis(&mut self) -> Result<(), ActionError> {
        self.begin_scope(BulkScope::AddTatamis, "beginAddTatamis")
    }
    pub fn end_add_tatamis(&mut self) {
        self.end_scope(BulkScope::AddTatamis);
        self.notify_tatamis_changed();
    }

    pub fn begin_erase_tatamis(&mut self) -> Result<(), ActionError> {
        self.begin_scope(BulkScope::EraseTatamis, "beginEraseTatamis")
    }
    pub fn end_erase_tatamis(&mut self) {
        self.end_scope(BulkScope::EraseTatamis);
        self.notify_tatamis_changed();
    }

    pub fn in_reset_matches_scope(&self) -> bool {
        self.active_scope == Some(BulkScope::ResetMatches)
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, ActionError> {
        self.players.get(&id).ok_or(ActionError::UnknownPlayer(id))
    }

    pub fn category(&self, id: CategoryId) -> Result<&Category, ActionError> {
        self.categories
            .get(&id)
            .ok_or(ActionError::UnknownCategory(id))
    }

    pub fn match_in_category(&self, category: CategoryId, id: MatchId) -> Result<&Match, ActionError> {
        self.categories
            .get(&category)
            .ok_or(ActionError::UnknownCategory(category))?;
        self.match_by_id(id)
    }

    pub fn match_by_id(&self, id: MatchId) -> Result<&Match, ActionError> {
        self.matches
            .get(&id)
            .ok_or(ActionError::UnknownMatch(id))
    }
}

// A flat match table keyed by id, separate from each category's ordered
// `matches` sequence + `match_index`, mirrors `squire_lib::round_registry`
// keeping `rounds: HashMap<u64, Round>` distinct from the ordering index.
impl Tournament {
    pub fn insert_match(&mut self, m: Match) {
        self.matches.insert(m.id, m);
    }

    pub fn remove_match(&mut self, id: MatchId) -> Option<Match> {
        self.matches.remove(&id)
    }

    pub fn match_mut(&mut self, id: MatchId) -> Result<&mut Match, ActionError> {
        self.matches.get_mut(&id).ok_or(ActionError::UnknownMatch(id))
    }
}
