//! The `Category` entity: a weight/age division together with
//! its ruleset, draw system tag, and its match list plus the auxiliary
//! index that keeps lookups O(1).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::draw::DrawTag;
use crate::identifiers::{CategoryId, MatchId, PlayerId};
use crate::matches::{MatchStatus, MatchType};
use crate::ruleset::RulesetTag;
use crate::tatami::BlockLocation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    pub not_started: usize,
    pub started: usize,
    pub finished: usize,
}

impl TypeCounts {
    pub fn total(&self) -> usize {
        self.not_started + self.started + self.finished
    }

    fn bucket_mut(&mut self, status: MatchStatus) -> &mut usize {
        match status {
            MatchStatus::NotStarted => &mut self.not_started,
            MatchStatus::Finished => &mut self.finished,
            MatchStatus::Paused | MatchStatus::Unpaused => &mut self.started,
        }
    }

    fn bucket_kind(status: MatchStatus) -> u8 {
        match status {
            MatchStatus::NotStarted => 0,
            MatchStatus::Paused | MatchStatus::Unpaused => 1,
            MatchStatus::Finished => 2,
        }
    }

    /// Moves one match's tally from `old`'s bucket to `new`'s bucket.
    /// A no-op if the two statuses share a bucket (e.g. Paused <-> Unpaused).
    pub fn move_status(&mut self, old: MatchStatus, new: MatchStatus) {
        if Self::bucket_kind(old) == Self::bucket_kind(new) {
            return;
        }
        let b = self.bucket_mut(old);
        *b = b.saturating_sub(1);
        *self.bucket_mut(new) += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub players: HashSet<PlayerId>,
    pub matches: Vec<MatchId>,
    pub match_index: HashMap<MatchId, usize>,
    pub counts: HashMap<MatchType, TypeCounts>,
    pub ruleset_tag: RulesetTag,
    pub draw_tag: DrawTag,
    pub locations: HashMap<MatchType, BlockLocation>,
}

impl Category {
    pub fn new(id: CategoryId, name: String, ruleset_tag: RulesetTag, draw_tag: DrawTag) -> Self {
        Category {
            id,
            name,
            players: HashSet::new(),
            matches: Vec::new(),
            match_index: HashMap::new(),
            counts: HashMap::new(),
            ruleset_tag,
            draw_tag,
            locations: HashMap::new(),
        }
    }

    pub fn push_match(&mut self, id: MatchId) {
        self.match_index.insert(id, self.matches.len());
        self.matches.push(id);
    }

    pub fn clear_matches(&mut self) -> Vec<MatchId> {
        self.match_index.clear();
        self.counts.clear();
        std::mem::take(&mut self.matches)
    }

    pub fn counts_for(&self, ty: MatchType) -> TypeCounts {
        self.counts.get(&ty).copied().unwrap_or_default()
    }

    pub fn counts_mut(&mut self, ty: MatchType) -> &mut TypeCounts {
        self.counts.entry(ty).or_default()
    }
}
