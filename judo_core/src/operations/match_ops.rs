//! `AddMatch`, `SetMatchPlayer`, and the match-event action family.
//! Match-event actions are grounded on
//! `original_source/core/actions/match_event_action.cpp`: apply snapshots
//! the full prior `MatchState` and event-log length, then — if the
//! transition crossed into or out of FINISHED — asks the draw system for
//! follow-up actions and applies them immediately, pushing them onto an
//! internal child stack undone LIFO before the match's own state is
//! restored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::draw::draw_system_for_tag;
use crate::error::ActionError;
use crate::identifiers::{CategoryId, MatchId, PlayerId};
use crate::matches::{Match, MatchEvent, MatchState, MatchStatus, MatchType, Side};
use crate::operations::{undo_children, Action, ActionTag, ApplyOutcome};
use crate::ruleset::ruleset_for_tag;
use crate::tournament::Tournament;

/// Only legal inside a `beginResetMatches` scope.
#[derive(Debug, Clone)]
pub struct AddMatch {
    pub id: MatchId,
    pub category: CategoryId,
    pub match_type: MatchType,
    pub title: String,
    pub white: Option<PlayerId>,
    pub blue: Option<PlayerId>,
    pub bye_eligible: bool,
    applied: bool,
}

impl AddMatch {
    pub fn new(
        id: MatchId,
        category: CategoryId,
        match_type: MatchType,
        title: String,
        white: Option<PlayerId>,
        blue: Option<PlayerId>,
    ) -> Self {
        Self::with_bye_eligibility(id, category, match_type, title, white, blue, false)
    }

    pub fn with_bye_eligibility(
        id: MatchId,
        category: CategoryId,
        match_type: MatchType,
        title: String,
        white: Option<PlayerId>,
        blue: Option<PlayerId>,
        bye_eligible: bool,
    ) -> Self {
        AddMatch {
            id,
            category,
            match_type,
            title,
            white,
            blue,
            bye_eligible,
            applied: false,
        }
    }
}

impl Action for AddMatch {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        if !tournament.in_reset_matches_scope() {
            return Err(ActionError::ReentrantBulkOp("addMatch outside beginResetMatches"));
        }
        let category = tournament
            .categories
            .get_mut(&self.category)
            .ok_or(ActionError::UnknownCategory(self.category))?;
        let mut m = Match::new(self.id, self.category, self.match_type, self.title.clone());
        m.bye_eligible = self.bye_eligible;
        m.set_player(Side::White, self.white);
        m.set_player(Side::Blue, self.blue);
        m.recompute_bye();
        let status = m.state.status;
        category.push_match(self.id);
        category.counts_mut(self.match_type).not_started += matches!(status, MatchStatus::NotStarted) as usize;
        category.counts_mut(self.match_type).finished += matches!(status, MatchStatus::Finished) as usize;

        if let Some(p) = self.white {
            if let Some(player) = tournament.players.get_mut(&p) {
                player.matches.insert((self.category, self.id));
            }
        }
        if let Some(p) = self.blue {
            if let Some(player) = tournament.players.get_mut(&p) {
                player.matches.insert((self.category, self.id));
            }
        }
        tournament.insert_match(m);
        self.applied = true;
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if !self.applied {
            return;
        }
        if let Some(m) = tournament.remove_match(self.id) {
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.matches.retain(|id| *id != self.id);
                category.match_index = category
                    .matches
                    .iter()
                    .enumerate()
                    .map(|(i, id)| (*id, i))
                    .collect();
                let counts = category.counts_mut(m.match_type);
                match m.state.status {
                    MatchStatus::NotStarted => counts.not_started = counts.not_started.saturating_sub(1),
                    MatchStatus::Finished => counts.finished = counts.finished.saturating_sub(1),
                    _ => counts.started = counts.started.saturating_sub(1),
                }
            }
            for p in [m.white_player, m.blue_player].into_iter().flatten() {
                if let Some(player) = tournament.players.get_mut(&p) {
                    player.matches.remove(&(self.category, self.id));
                }
            }
        }
        self.applied = false;
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(AddMatch::with_bye_eligibility(
            self.id,
            self.category,
            self.match_type,
            self.title.clone(),
            self.white,
            self.blue,
            self.bye_eligible,
        ))
    }

    fn description(&self) -> String {
        format!("add match {} ({})", self.title, self.id)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::AddMatch
    }
}

#[derive(Debug, Clone)]
pub struct SetMatchPlayer {
    pub category: CategoryId,
    pub match_id: MatchId,
    pub side: Side,
    pub player: Option<PlayerId>,
    prior: Option<Option<PlayerId>>,
}

impl SetMatchPlayer {
    pub fn new(category: CategoryId, match_id: MatchId, side: Side, player: Option<PlayerId>) -> Self {
        SetMatchPlayer {
            category,
            match_id,
            side,
            player,
            prior: None,
        }
    }
}

impl Action for SetMatchPlayer {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let m = tournament.match_mut(self.match_id)?;
        let prior = m.player(self.side);
        if prior == self.player {
            return Ok(ApplyOutcome::NoOp);
        }
        let match_type = m.match_type;
        let old_status = m.state.status;
        m.set_player(self.side, self.player);
        m.recompute_bye();
        let new_status = m.state.status;
        self.prior = Some(prior);

        if let Some(category) = tournament.categories.get_mut(&self.category) {
            category.counts_mut(match_type).move_status(old_status, new_status);
        }
        if let Some(p) = prior {
            if let Some(player) = tournament.players.get_mut(&p) {
                player.matches.remove(&(self.category, self.match_id));
            }
        }
        if let Some(p) = self.player {
            if let Some(player) = tournament.players.get_mut(&p) {
                player.matches.insert((self.category, self.match_id));
            }
        }
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        let Some(prior) = self.prior.take() else {
            return;
        };
        if let Some(p) = self.player {
            if let Some(player) = tournament.players.get_mut(&p) {
                player.matches.remove(&(self.category, self.match_id));
            }
        }
        if let Ok(m) = tournament.match_mut(self.match_id) {
            let match_type = m.match_type;
            let new_status = m.state.status;
            m.set_player(self.side, prior);
            m.recompute_bye();
            let old_status = m.state.status;
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.counts_mut(match_type).move_status(new_status, old_status);
            }
        }
        if let Some(p) = prior {
            if let Some(player) = tournament.players.get_mut(&p) {
                player.matches.insert((self.category, self.match_id));
            }
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(SetMatchPlayer::new(
            self.category,
            self.match_id,
            self.side,
            self.player,
        ))
    }

    fn description(&self) -> String {
        format!("set {:?} player on match {}", self.side, self.match_id)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::SetMatchPlayer
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MatchEventKind {
    Resume,
    Pause,
    AwardIppon(Side),
    AwardWazari(Side),
    AwardShido(Side),
    AwardHansokuMake(Side),
}

impl MatchEventKind {
    fn tag(&self) -> ActionTag {
        match self {
            MatchEventKind::Resume => ActionTag::MatchResume,
            MatchEventKind::Pause => ActionTag::MatchPause,
            MatchEventKind::AwardIppon(_) => ActionTag::MatchAwardIppon,
            MatchEventKind::AwardWazari(_) => ActionTag::MatchAwardWazari,
            MatchEventKind::AwardShido(_) => ActionTag::MatchAwardShido,
            MatchEventKind::AwardHansokuMake(_) => ActionTag::MatchAwardHansokuMake,
        }
    }

    fn into_event(self, at: DateTime<Utc>) -> MatchEvent {
        match self {
            MatchEventKind::Resume => MatchEvent::Resume { at },
            MatchEventKind::Pause => MatchEvent::Pause { at },
            MatchEventKind::AwardIppon(side) => MatchEvent::AwardIppon { side, at },
            MatchEventKind::AwardWazari(side) => MatchEvent::AwardWazari { side, at },
            MatchEventKind::AwardShido(side) => MatchEvent::AwardShido { side, at },
            MatchEventKind::AwardHansokuMake(side) => MatchEvent::AwardHansokuMake { side, at },
        }
    }
}

/// Drives a match through the ruleset and cascades draw-system follow-ups
/// on completion (or reversion), grounded on
/// `match_event_action.cpp::notify`/`recover`.
pub struct MatchEventAction {
    pub category: CategoryId,
    pub match_id: MatchId,
    pub kind: MatchEventKind,
    pub at: DateTime<Utc>,
    prior_state: Option<MatchState>,
    prior_event_len: usize,
    prior_last_finish: Option<Option<DateTime<Utc>>>,
    draw_children: Vec<Box<dyn Action>>,
}

impl MatchEventAction {
    pub fn new(category: CategoryId, match_id: MatchId, kind: MatchEventKind, at: DateTime<Utc>) -> Self {
        MatchEventAction {
            category,
            match_id,
            kind,
            at,
            prior_state: None,
            prior_event_len: 0,
            prior_last_finish: None,
            draw_children: Vec::new(),
        }
    }

    fn side_player(m: &Match, kind: MatchEventKind) -> Option<PlayerId> {
        match kind {
            MatchEventKind::AwardIppon(s)
            | MatchEventKind::AwardWazari(s)
            | MatchEventKind::AwardShido(s)
            | MatchEventKind::AwardHansokuMake(s) => m.player(s),
            _ => None,
        }
    }
}

impl Action for MatchEventAction {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let category = tournament
            .categories
            .get(&self.category)
            .ok_or(ActionError::UnknownCategory(self.category))?;
        let ruleset = ruleset_for_tag(category.ruleset_tag)?;
        let match_type;
        let finishing_player;
        let was_finished;
        let now_finished;
        let old_status;
        let new_status;
        {
            let m = tournament.match_mut(self.match_id)?;
            self.prior_state = Some(m.state.clone());
            self.prior_event_len = m.events.len();
            was_finished = m.is_finished();
            match_type = m.match_type;
            old_status = m.state.status;

            let event = self.kind.into_event(self.at);
            let next = ruleset.score(&m.state, &event);
            m.events.push(event);
            m.state = next;
            now_finished = m.is_finished();
            new_status = m.state.status;
            finishing_player = if now_finished && !was_finished {
                Self::side_player(m, self.kind).or_else(|| ruleset.winner(&m.state).and_then(|s| m.player(s)))
            } else {
                None
            };
        }

        if now_finished && !was_finished {
            if let Some(p) = finishing_player {
                self.prior_last_finish = Some(tournament.players.get(&p).and_then(|pl| pl.last_finish_time));
                if let Some(player) = tournament.players.get_mut(&p) {
                    player.last_finish_time = Some(self.at);
                }
            }
        }

        let category = tournament.categories.get_mut(&self.category).unwrap();
        category.counts_mut(match_type).move_status(old_status, new_status);

        if now_finished != was_finished {
            let draw = draw_system_for_tag(tournament.categories[&self.category].draw_tag)?;
            let follow_ups = draw.update_category(tournament, self.category);
            for mut child in follow_ups {
                child.apply(tournament)?;
                self.draw_children.push(child);
            }
        }

        tournament.notify_matches_changed(self.category, vec![self.match_id]);
        tournament.notify_tatamis_changed();
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        undo_children(&mut self.draw_children, tournament);

        let Some(prior_state) = self.prior_state.take() else {
            return;
        };
        let old_status = prior_state.status;
        let (match_type, new_status) = match tournament.match_mut(self.match_id) {
            Ok(m) => {
                let new_status = m.state.status;
                m.state = prior_state;
                m.events.truncate(self.prior_event_len);
                (m.match_type, new_status)
            }
            Err(_) => return,
        };

        if let Some(prior_last_finish) = self.prior_last_finish.take() {
            let finishing_player = tournament
                .match_by_id(self.match_id)
                .ok()
                .and_then(|m| Self::side_player(m, self.kind));
            if let Some(p) = finishing_player {
                if let Some(player) = tournament.players.get_mut(&p) {
                    player.last_finish_time = prior_last_finish;
                }
            }
        }

        if let Some(category) = tournament.categories.get_mut(&self.category) {
            category.counts_mut(match_type).move_status(new_status, old_status);
        }

        tournament.notify_matches_changed(self.category, vec![self.match_id]);
        tournament.notify_tatamis_changed();
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(MatchEventAction::new(self.category, self.match_id, self.kind, self.at))
    }

    fn description(&self) -> String {
        format!("match event {:?} on {}", self.kind, self.match_id)
    }

    fn tag(&self) -> ActionTag {
        self.kind.tag()
    }
}
