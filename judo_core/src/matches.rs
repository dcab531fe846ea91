//! The `Match` entity. Named `matches` rather than `match` to
//! avoid the reserved keyword, mirroring how squire_lib names its round
//! module `round.rs` rather than after any reserved word it would clash
//! with.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{CategoryId, MatchId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Knockout,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    White,
    Blue,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::White => Side::Blue,
            Side::Blue => Side::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    NotStarted,
    Paused,
    Unpaused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub ippon: u8,
    pub wazari: u8,
    pub shido: u8,
    pub hansoku_make: bool,
}

/// A single journaled occurrence used for exact undo: trimming the event
/// log back to a recorded length is how match-event actions restore state
/// without re-deriving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    Resume { at: DateTime<Utc> },
    Pause { at: DateTime<Utc> },
    AwardIppon { side: Side, at: DateTime<Utc> },
    AwardWazari { side: Side, at: DateTime<Utc> },
    AwardShido { side: Side, at: DateTime<Utc> },
    AwardHansokuMake { side: Side, at: DateTime<Utc> },
}

/// The scoring-relevant slice of a match, passed to [`crate::ruleset::Ruleset`]
/// in isolation so rulesets stay pure with respect to the rest of the
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub status: MatchStatus,
    pub white: Score,
    pub blue: Score,
    pub elapsed: Duration,
    pub resume_time: Option<DateTime<Utc>>,
    pub golden_score: bool,
}

impl MatchState {
    pub fn score(&self, side: Side) -> &Score {
        match side {
            Side::White => &self.white,
            Side::Blue => &self.blue,
        }
    }

    pub fn score_mut(&mut self, side: Side) -> &mut Score {
        match side {
            Side::White => &mut self.white,
            Side::Blue => &mut self.blue,
        }
    }
}

impl Default for MatchState {
    fn default() -> Self {
        MatchState {
            status: MatchStatus::NotStarted,
            white: Score::default(),
            blue: Score::default(),
            elapsed: Duration::zero(),
            resume_time: None,
            golden_score: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub category: CategoryId,
    pub match_type: MatchType,
    /// Human-readable label for the match; Knockout fills this with the
    /// original's round/position naming scheme.
    pub title: String,
    pub bye: bool,
    /// Only a match the draw system actually built as a leaf with a
    /// structurally permanent single opponent (a knockout round-0 slot)
    /// may auto-finish as a BYE from a single filled side. Every other
    /// match (pool play, double-pool, or a knockout match wired from a
    /// still-pending predecessor) keeps this false so a lone fill never
    /// gets mistaken for a walkover.
    pub bye_eligible: bool,
    pub white_player: Option<PlayerId>,
    pub blue_player: Option<PlayerId>,
    pub state: MatchState,
    pub events: Vec<MatchEvent>,
}

impl Match {
    pub fn new(id: MatchId, category: CategoryId, match_type: MatchType, title: String) -> Self {
        Match {
            id,
            category,
            match_type,
            title,
            bye: false,
            bye_eligible: false,
            white_player: None,
            blue_player: None,
            state: MatchState::default(),
            events: Vec::new(),
        }
    }

    pub fn player(&self, side: Side) -> Option<PlayerId> {
        match side {
            Side::White => self.white_player,
            Side::Blue => self.blue_player,
        }
    }

    pub fn set_player(&mut self, side: Side, player: Option<PlayerId>) {
        match side {
            Side::White => self.white_player = player,
            Side::Blue => self.blue_player = player,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.status == MatchStatus::Finished
    }

    /// A BYE match is FINISHED with a single present player, but only when
    /// `bye_eligible`: a non-eligible match with exactly one slot filled is
    /// just waiting on its other slot and must stay playable. If a second
    /// player later fills in an eligible match that was a BYE, it reverts
    /// to a fresh, playable NotStarted state rather than staying stuck
    /// Finished.
    pub fn recompute_bye(&mut self) {
        if !self.bye_eligible {
            self.bye = false;
            return;
        }
        let filled = self.white_player.is_some() as u8 + self.blue_player.is_some() as u8;
        let was_bye = self.bye;
        self.bye = filled == 1;
        if self.bye {
            self.state.status = MatchStatus::Finished;
        } else if was_bye {
            self.state = MatchState::default();
            self.events.clear();
        }
    }

    pub fn winner_player(&self, winner_side: Option<Side>) -> Option<PlayerId> {
        winner_side.and_then(|s| self.player(s))
    }
}
