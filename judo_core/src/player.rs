//! The `Player` entity: identity fields plus reverse-index links back to
//! the categories and matches that reference it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::identifiers::{CategoryId, MatchId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerFields {
    pub first_name: String,
    pub last_name: String,
    pub club: Option<String>,
    pub age: Option<u8>,
    pub weight: Option<f32>,
    pub rank: Option<String>,
    pub country: Option<String>,
    pub sex: Option<Sex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub fields: PlayerFields,
    /// Reverse index: `c ∈ categories ⇔ p.id ∈ tournament.categories[c].players`.
    pub categories: HashSet<CategoryId>,
    /// Reverse index: `(c, m) ∈ matches ⇔` the match references this player.
    pub matches: HashSet<(CategoryId, MatchId)>,
    pub last_finish_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl Player {
    pub fn new(id: PlayerId, fields: PlayerFields) -> Self {
        Player {
            id,
            fields,
            categories: HashSet::new(),
            matches: HashSet::new(),
            last_finish_time: None,
        }
    }
}
