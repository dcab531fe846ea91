//! Pluggable judo scoring rules.
//!
//! A ruleset is pure with respect to match state: given a match snapshot
//! and an event it returns the next status and score delta without
//! touching the store. Rulesets are addressed by a small integer tag
//! (`RulesetTag`) resolved through a static table, matching the closed-set
//! design `squire_lib::tournament::scoring_system_factory` uses for
//! scoring systems rather than open dynamic registration.

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::matches::{MatchEvent, MatchState, MatchStatus, Side};

/// A closed, persistable tag identifying which [`Ruleset`] a category
/// uses. The behavior table is resolved at load time by
/// [`ruleset_for_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetTag(pub u8);

impl RulesetTag {
    pub const IJF_STANDARD: RulesetTag = RulesetTag(0);
}

pub trait Ruleset: Send + Sync {
    fn tag(&self) -> RulesetTag;

    fn name(&self) -> &'static str;

    /// Applies `event` to `prior`, returning the resulting status and
    /// score mutation. Pure: does not read or write the store.
    fn score(&self, prior: &MatchState, event: &MatchEvent) -> MatchState;

    fn winner(&self, state: &MatchState) -> Option<Side>;

    fn expected_duration(&self) -> chrono::Duration;

    fn clone_boxed(&self) -> Box<dyn Ruleset>;
}

impl Clone for Box<dyn Ruleset> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// The IJF-style standard ruleset: ippon or hansoku-make ends the match
/// outright; otherwise the player with more score (waza-ari counted above
/// shido penalties) at time expiry wins, entering golden score on a tie.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRuleset;

impl Ruleset for StandardRuleset {
    fn tag(&self) -> RulesetTag {
        RulesetTag::IJF_STANDARD
    }

    fn name(&self) -> &'static str {
        "IJF Standard"
    }

    fn score(&self, prior: &MatchState, event: &MatchEvent) -> MatchState {
        let mut next = prior.clone();
        match *event {
            MatchEvent::Resume { at } => {
                next.status = MatchStatus::Unpaused;
                next.resume_time = Some(at);
            }
            MatchEvent::Pause { at } => {
                if let Some(resume) = next.resume_time.take() {
                    next.elapsed = next.elapsed + (at - resume);
                }
                next.status = MatchStatus::Paused;
            }
            MatchEvent::AwardIppon { side, .. } => {
                next.score_mut(side).ippon += 1;
                next.status = MatchStatus::Finished;
            }
            MatchEvent::AwardWazari { side, .. } => {
                next.score_mut(side).wazari += 1;
                if next.score_mut(side).wazari >= 2 {
                    next.status = MatchStatus::Finished;
                }
            }
            MatchEvent::AwardShido { side, .. } => {
                next.score_mut(side).shido += 1;
                if next.score_mut(side).shido >= 3 {
                    next.status = MatchStatus::Finished;
                }
            }
            MatchEvent::AwardHansokuMake { side, .. } => {
                next.score_mut(side).hansoku_make = true;
                next.status = MatchStatus::Finished;
            }
        }
        next
    }

    fn winner(&self, state: &MatchState) -> Option<Side> {
        if state.white.hansoku_make {
            return Some(Side::Blue);
        }
        if state.blue.hansoku_make {
            return Some(Side::White);
        }
        if state.white.ippon > 0 || state.white.wazari >= 2 {
            return Some(Side::White);
        }
        if state.blue.ippon > 0 || state.blue.wazari >= 2 {
            return Some(Side::Blue);
        }
        if state.status != MatchStatus::Finished {
            return None;
        }
        use std::cmp::Ordering;
        match state.white.wazari.cmp(&state.blue.wazari) {
            Ordering::Greater => Some(Side::White),
            Ordering::Less => Some(Side::Blue),
            Ordering::Equal => match state.blue.shido.cmp(&state.white.shido) {
                Ordering::Greater => Some(Side::White),
                Ordering::Less => Some(Side::Blue),
                Ordering::Equal => None,
            },
        }
    }

    fn expected_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(4)
    }

    fn clone_boxed(&self) -> Box<dyn Ruleset> {
        Box::new(*self)
    }
}

pub fn ruleset_for_tag(tag: RulesetTag) -> Result<Box<dyn Ruleset>, ActionError> {
    match tag {
        RulesetTag::IJF_STANDARD => Ok(Box::new(StandardRuleset)),
        RulesetTag(n) => Err(ActionError::RulesetTagOutOfRange(n)),
    }
}
