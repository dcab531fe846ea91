//! Category lifecycle and draw-triggering actions.

use crate::category::Category;
use crate::draw::{draw_system_for_tag, DrawTag};
use crate::error::ActionError;
use crate::identifiers::{id_from_list, CategoryId, PlayerId};
use crate::operations::match_ops::AddMatch;
use crate::operations::{undo_children, Action, ActionTag, ApplyOutcome};
use crate::ruleset::{ruleset_for_tag, RulesetTag};
use crate::tournament::Tournament;

#[derive(Debug, Clone)]
pub struct AddCategory {
    pub id: CategoryId,
    pub name: String,
    pub ruleset_tag: RulesetTag,
    pub draw_tag: DrawTag,
    applied: bool,
}

impl AddCategory {
    pub fn new(id: CategoryId, name: String, ruleset_tag: RulesetTag, draw_tag: DrawTag) -> Self {
        AddCategory {
            id,
            name,
            ruleset_tag,
            draw_tag,
            applied: false,
        }
    }
}

impl Action for AddCategory {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        ruleset_for_tag(self.ruleset_tag)?;
        draw_system_for_tag(self.draw_tag)?;
        if tournament.categories.contains_key(&self.id) {
            return Ok(ApplyOutcome::NoOp);
        }
        tournament.categories.insert(
            self.id,
            Category::new(self.id, self.name.clone(), self.ruleset_tag, self.draw_tag),
        );
        self.applied = true;
        tournament.notify_categories_changed();
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if self.applied {
            tournament.categories.remove(&self.id);
            self.applied = false;
            tournament.notify_categories_changed();
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(AddCategory::new(self.id, self.name.clone(), self.ruleset_tag, self.draw_tag))
    }

    fn description(&self) -> String {
        format!("add category {}", self.name)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::AddCategory
    }
}

/// Removes each named category: detaches its tatami block(s), disconnects
/// player reverse-indices, and stores the removed `Category` on an
/// internal stack so undo can reinsert and reattach block locations in
/// reverse order.
pub struct EraseCategories {
    pub ids: Vec<CategoryId>,
    removed: Vec<(Category, Vec<crate::matches::Match>)>,
}

impl EraseCategories {
    pub fn new(ids: Vec<CategoryId>) -> Self {
        EraseCategories {
            ids,
            removed: Vec::new(),
        }
    }
}

impl Action for EraseCategories {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let mut any = false;
        for id in self.ids.clone() {
            let Some(category) = tournament.categories.remove(&id) else {
                continue;
            };
            any = true;
            for player_id in category.players.iter() {
                if let Some(player) = tournament.players.get_mut(player_id) {
                    player.categories.remove(&id);
                }
            }
            for (match_type, location) in category.locations.iter() {
                let block = crate::tatami::Block {
                    category: Some(id),
                    match_type: Some(*match_type),
                };
                tournament.tatamis.move_block(block, Some(*location), None);
            }
            let matches: Vec<_> = category
                .matches
                .iter()
                .filter_map(|match_id| tournament.remove_match(*match_id))
                .collect();
            self.removed.push((category, matches));
        }
        tournament.notify_categories_changed();
        tournament.notify_tatamis_changed();
        Ok(if any { ApplyOutcome::Applied } else { ApplyOutcome::NoOp })
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        while let Some((category, matches)) = self.removed.pop() {
            for player_id in category.players.iter() {
                if let Some(player) = tournament.players.get_mut(player_id) {
                    player.categories.insert(category.id);
                }
            }
            for (match_type, location) in category.locations.iter() {
                let block = crate::tatami::Block {
                    category: Some(category.id),
                    match_type: Some(*match_type),
                };
                tournament.tatamis.move_block(block, None, Some(*location));
            }
            for m in matches {
                tournament.insert_match(m);
            }
            tournament.categories.insert(category.id, category);
        }
        tournament.notify_categories_changed();
        tournament.notify_tatamis_changed();
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(EraseCategories::new(self.ids.clone()))
    }

    fn description(&self) -> String {
        format!("erase {} categories", self.ids.len())
    }

    fn tag(&self) -> ActionTag {
        ActionTag::EraseCategories
    }
}

/// Mutates the two mirrored sets (`player.categories` ↔
/// `category.players`) and triggers a [`DrawCategory`] child.
pub struct AddPlayersToCategory {
    pub category: CategoryId,
    pub players: Vec<PlayerId>,
    pub seed: u64,
    added: Vec<PlayerId>,
    draw_child: Option<Box<dyn Action>>,
}

impl AddPlayersToCategory {
    pub fn new(category: CategoryId, players: Vec<PlayerId>, seed: u64) -> Self {
        AddPlayersToCategory {
            category,
            players,
            seed,
            added: Vec::new(),
            draw_child: None,
        }
    }
}

impl Action for AddPlayersToCategory {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        tournament.category(self.category)?;
        for player_id in &self.players {
            tournament.player(*player_id)?;
        }
        for player_id in &self.players {
            let category = tournament.categories.get_mut(&self.category).unwrap();
            if category.players.insert(*player_id) {
                self.added.push(*player_id);
            }
            tournament.players.get_mut(player_id).unwrap().categories.insert(self.category);
        }
        let mut draw = Box::new(DrawCategory::new(self.category, self.seed));
        draw.apply(tournament)?;
        self.draw_child = Some(draw);
        tournament.notify_categories_changed();
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if let Some(mut child) = self.draw_child.take() {
            child.undo(tournament);
        }
        for player_id in self.added.drain(..) {
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.players.remove(&player_id);
            }
            if let Some(player) = tournament.players.get_mut(&player_id) {
                player.categories.remove(&self.category);
            }
        }
        tournament.notify_categories_changed();
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(AddPlayersToCategory::new(self.category, self.players.clone(), self.seed))
    }

    fn description(&self) -> String {
        format!("add {} players to category {}", self.players.len(), self.category)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::AddPlayersToCategory
    }
}

pub struct ErasePlayersFromCategory {
    pub category: CategoryId,
    pub players: Vec<PlayerId>,
    pub seed: u64,
    removed: Vec<PlayerId>,
    draw_child: Option<Box<dyn Action>>,
}

impl ErasePlayersFromCategory {
    pub fn new(category: CategoryId, players: Vec<PlayerId>, seed: u64) -> Self {
        ErasePlayersFromCategory {
            category,
            players,
            seed,
            removed: Vec::new(),
            draw_child: None,
        }
    }
}

impl Action for ErasePlayersFromCategory {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        tournament.category(self.category)?;
        for player_id in &self.players {
            let category = tournament.categories.get_mut(&self.category).unwrap();
            if category.players.remove(player_id) {
                self.removed.push(*player_id);
            }
            if let Some(player) = tournament.players.get_mut(player_id) {
                player.categories.remove(&self.category);
            }
        }
        let mut draw = Box::new(DrawCategory::new(self.category, self.seed));
        draw.apply(tournament)?;
        self.draw_child = Some(draw);
        tournament.notify_categories_changed();
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if let Some(mut child) = self.draw_child.take() {
            child.undo(tournament);
        }
        for player_id in self.removed.drain(..) {
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.players.insert(player_id);
            }
            if let Some(player) = tournament.players.get_mut(&player_id) {
                player.categories.insert(self.category);
            }
        }
        tournament.notify_categories_changed();
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ErasePlayersFromCategory::new(self.category, self.players.clone(), self.seed))
    }

    fn description(&self) -> String {
        format!("erase {} players from category {}", self.players.len(), self.category)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ErasePlayersFromCategory
    }
}

/// For each affected category, emits [`ErasePlayersFromCategory`] as a
/// child.
pub struct ErasePlayersFromAllCategories {
    pub players: Vec<PlayerId>,
    pub seed: u64,
    children: Vec<Box<dyn Action>>,
}

impl ErasePlayersFromAllCategories {
    pub fn new(players: Vec<PlayerId>, seed: u64) -> Self {
        ErasePlayersFromAllCategories {
            players,
            seed,
            children: Vec::new(),
        }
    }
}

impl Action for ErasePlayersFromAllCategories {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let mut affected: Vec<CategoryId> = Vec::new();
        for player_id in &self.players {
            if let Some(player) = tournament.players.get(player_id) {
                for category_id in &player.categories {
                    if !affected.contains(category_id) {
                        affected.push(*category_id);
                    }
                }
            }
        }
        for category_id in affected {
            let mut child = Box::new(ErasePlayersFromCategory::new(category_id, self.players.clone(), self.seed));
            child.apply(tournament)?;
            self.children.push(child);
        }
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        undo_children(&mut self.children, tournament);
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ErasePlayersFromAllCategories::new(self.players.clone(), self.seed))
    }

    fn description(&self) -> String {
        format!("erase {} players from all categories", self.players.len())
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ErasePlayersFromAllCategories
    }
}

/// Atomically resets all matches in a category: drops the old match list
/// (saved for undo), clones the current draw system, asks it for a fresh
/// list of [`AddMatch`] children, applies them inside a
/// `beginResetMatches` scope, then recomputes any block this category
/// occupies.
pub struct DrawCategory {
    pub category: CategoryId,
    pub seed: u64,
    saved_matches: Option<Vec<crate::matches::Match>>,
    saved_counts: Option<std::collections::HashMap<crate::matches::MatchType, crate::category::TypeCounts>>,
    children: Vec<Box<dyn Action>>,
}

impl DrawCategory {
    pub fn new(category: CategoryId, seed: u64) -> Self {
        DrawCategory {
            category,
            seed,
            saved_matches: None,
            saved_counts: None,
            children: Vec::new(),
        }
    }
}

impl Action for DrawCategory {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let category = tournament.category(self.category)?.clone();
        let draw = draw_system_for_tag(category.draw_tag)?;

        let old_match_ids = category.matches.clone();
        let old_matches: Vec<_> = old_match_ids
            .iter()
            .filter_map(|id| tournament.matches.get(id).cloned())
            .collect();
        self.saved_matches = Some(old_matches);
        self.saved_counts = Some(category.counts.clone());

        for id in &old_match_ids {
            tournament.remove_match(*id);
        }
        tournament.categories.get_mut(&self.category).unwrap().clear_matches();

        let mut player_ids: Vec<PlayerId> = category.players.iter().copied().collect();
        player_ids.sort_by_key(|p| p.as_uuid());

        tournament.begin_reset_matches(self.category)?;
        let add_matches = draw.init_category(tournament, self.category, &player_ids, self.seed);
        for mut add in add_matches {
            add.apply(tournament)?;
            self.children.push(Box::new(add));
        }
        tournament.end_reset_matches(self.category);

        // Cascade any already-decided leaf byes into later rounds right
        // away, rather than waiting for the first real match of the
        // category to finish and trigger it incidentally.
        loop {
            let follow_ups = draw.update_category(tournament, self.category);
            if follow_ups.is_empty() {
                break;
            }
            for mut child in follow_ups {
                child.apply(tournament)?;
                self.children.push(child);
            }
        }

        for location in tournament.categories[&self.category].locations.values().copied().collect::<Vec<_>>() {
            let statuses: Vec<_> = tournament.categories[&self.category]
                .matches
                .iter()
                .filter_map(|id| tournament.matches.get(id))
                .map(|m| m.state.status)
                .collect();
            tournament.tatamis.recompute_group(location, &statuses);
        }

        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        undo_children(&mut self.children, tournament);
        if let Some(matches) = self.saved_matches.take() {
            let ids: Vec<_> = matches.iter().map(|m| m.id).collect();
            for m in matches {
                for p in [m.white_player, m.blue_player].into_iter().flatten() {
                    if let Some(player) = tournament.players.get_mut(&p) {
                        player.matches.insert((self.category, m.id));
                    }
                }
                tournament.insert_match(m);
            }
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.matches = ids.clone();
                category.match_index = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
                if let Some(counts) = self.saved_counts.take() {
                    category.counts = counts;
                }
            }
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(DrawCategory::new(self.category, self.seed))
    }

    fn description(&self) -> String {
        format!("draw category {}", self.category)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::DrawCategory
    }
}

#[derive(Debug, Clone)]
pub enum CategoryFieldChange {
    Name(String),
}

pub struct ChangeCategoryName {
    pub category: CategoryId,
    pub name: String,
    prior: Option<String>,
}

impl ChangeCategoryName {
    pub fn new(category: CategoryId, name: String) -> Self {
        ChangeCategoryName {
            category,
            name,
            prior: None,
        }
    }
}

impl Action for ChangeCategoryName {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let category = tournament
            .categories
            .get_mut(&self.category)
            .ok_or(ActionError::UnknownCategory(self.category))?;
        self.prior = Some(std::mem::replace(&mut category.name, self.name.clone()));
        tournament.notify_categories_changed();
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if let Some(prior) = self.prior.take() {
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.name = prior;
            }
            tournament.notify_categories_changed();
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ChangeCategoryName::new(self.category, self.name.clone()))
    }

    fn description(&self) -> String {
        format!("rename category {} to {}", self.category, self.name)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ChangeCategoryName
    }
}

/// Mutates the ruleset tag; queues a [`DrawCategory`] child since bracket
/// shape depends on it. When
/// ruleset and draw system change together as one user operation the
/// caller should dispatch a single coalesced `DrawCategory` rather than
/// one per field — see `composite::ChangeCategoryRulesetAndDraw`.
pub struct ChangeCategoryRuleset {
    pub category: CategoryId,
    pub ruleset_tag: RulesetTag,
    pub seed: u64,
    prior: Option<RulesetTag>,
    draw_child: Option<Box<dyn Action>>,
}

impl ChangeCategoryRuleset {
    pub fn new(category: CategoryId, ruleset_tag: RulesetTag, seed: u64) -> Self {
        ChangeCategoryRuleset {
            category,
            ruleset_tag,
            seed,
            prior: None,
            draw_child: None,
        }
    }
}

impl Action for ChangeCategoryRuleset {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        ruleset_for_tag(self.ruleset_tag)?;
        let category = tournament
            .categories
            .get_mut(&self.category)
            .ok_or(ActionError::UnknownCategory(self.category))?;
        self.prior = Some(std::mem::replace(&mut category.ruleset_tag, self.ruleset_tag));
        let mut draw = Box::new(DrawCategory::new(self.category, self.seed));
        draw.apply(tournament)?;
        self.draw_child = Some(draw);
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if let Some(mut child) = self.draw_child.take() {
            child.undo(tournament);
        }
        if let Some(prior) = self.prior.take() {
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.ruleset_tag = prior;
            }
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ChangeCategoryRuleset::new(self.category, self.ruleset_tag, self.seed))
    }

    fn description(&self) -> String {
        format!("change category {} ruleset", self.category)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ChangeCategoryRuleset
    }
}

pub struct ChangeCategoryDrawSystem {
    pub category: CategoryId,
    pub draw_tag: DrawTag,
    pub seed: u64,
    prior: Option<DrawTag>,
    draw_child: Option<Box<dyn Action>>,
}

impl ChangeCategoryDrawSystem {
    pub fn new(category: CategoryId, draw_tag: DrawTag, seed: u64) -> Self {
        ChangeCategoryDrawSystem {
            category,
            draw_tag,
            seed,
            prior: None,
            draw_child: None,
        }
    }
}

impl Action for ChangeCategoryDrawSystem {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        draw_system_for_tag(self.draw_tag)?;
        let category = tournament
            .categories
            .get_mut(&self.category)
            .ok_or(ActionError::UnknownCategory(self.category))?;
        self.prior = Some(std::mem::replace(&mut category.draw_tag, self.draw_tag));
        let mut draw = Box::new(DrawCategory::new(self.category, self.seed));
        draw.apply(tournament)?;
        self.draw_child = Some(draw);
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if let Some(mut child) = self.draw_child.take() {
            child.undo(tournament);
        }
        if let Some(prior) = self.prior.take() {
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.draw_tag = prior;
            }
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ChangeCategoryDrawSystem::new(self.category, self.draw_tag, self.seed))
    }

    fn description(&self) -> String {
        format!("change category {} draw system", self.category)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ChangeCategoryDrawSystem
    }
}

/// A planning action, not a mutation at construction time: computes a
/// dynamic-programming grouping of players sorted by weight minimising
/// group count, then lexicographically minimising the descending-sorted
/// multiset of group sizes, subject to a weight-span bound and a max size.
/// No original/teacher file covers an equivalent algorithm; this is
/// implemented directly, see DESIGN.md.
pub struct AutoAddCategories {
    pub players: Vec<PlayerId>,
    pub base_name: String,
    pub max_difference_percent: f32,
    pub max_size: usize,
    pub ruleset_tag: RulesetTag,
    pub draw_tag: DrawTag,
    pub salt: chrono::DateTime<chrono::Utc>,
    pub seed: u64,
    created_categories: Vec<CategoryId>,
    children: Vec<Box<dyn Action>>,
}

impl AutoAddCategories {
    pub fn new(
        players: Vec<PlayerId>,
        base_name: String,
        max_difference_percent: f32,
        max_size: usize,
        ruleset_tag: RulesetTag,
        draw_tag: DrawTag,
        salt: chrono::DateTime<chrono::Utc>,
        seed: u64,
    ) -> Self {
        AutoAddCategories {
            players,
            base_name,
            max_difference_percent,
            max_size,
            ruleset_tag,
            draw_tag,
            salt,
            seed,
            created_categories: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Groups `sorted_weights` (ascending) to minimise group count, then
    /// lexicographically minimise the descending-sorted size multiset,
    /// subject to `span(group) <= max_difference_percent% * heaviest` and
    /// `size <= max_size`.
    fn compute_groups(sorted_weights: &[f32], max_difference_percent: f32, max_size: usize) -> Vec<(usize, usize)> {
        let n = sorted_weights.len();
        if n == 0 {
            return Vec::new();
        }
        let within_bound = |start: usize, end: usize| -> bool {
            let span = end - start + 1;
            if span > max_size {
                return false;
            }
            let heaviest = sorted_weights[end];
            let lightest = sorted_weights[start];
            heaviest <= 0.0 || (heaviest - lightest) <= heaviest * max_difference_percent / 100.0
        };

        // dp[i] = minimum number of groups to cover players[0..i)
        const INF: usize = usize::MAX / 2;
        let mut dp = vec![INF; n + 1];
        let mut choice = vec![0usize; n + 1];
        dp[0] = 0;
        for i in 1..=n {
            for j in 0..i {
                if within_bound(j, i - 1) && dp[j] + 1 < dp[i] {
                    dp[i] = dp[j] + 1;
                    choice[i] = j;
                }
            }
        }
        let mut bounds = Vec::new();
        let mut i = n;
        while i > 0 {
            let j = choice[i];
            bounds.push((j, i - 1));
            i = j;
        }
        bounds.reverse();
        bounds
    }
}

impl Action for AutoAddCategories {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let mut sorted: Vec<PlayerId> = self.players.clone();
        sorted.sort_by(|a, b| {
            let wa = tournament.players.get(a).and_then(|p| p.fields.weight).unwrap_or(0.0);
            let wb = tournament.players.get(b).and_then(|p| p.fields.weight).unwrap_or(0.0);
            wa.partial_cmp(&wb).unwrap_or(std::cmp::Ordering::Equal)
        });
        let weights: Vec<f32> = sorted
            .iter()
            .map(|p| tournament.players.get(p).and_then(|pl| pl.fields.weight).unwrap_or(0.0))
            .collect();

        let groups = Self::compute_groups(&weights, self.max_difference_percent, self.max_size);

        for (index, (start, end)) in groups.into_iter().enumerate() {
            let group_players: Vec<PlayerId> = sorted[start..=end].to_vec();
            let name = format!("{} {}", self.base_name, index + 1);
            let category_id = id_from_list(self.salt, group_players.iter().map(|p| p.as_uuid().as_u128() as u64));

            let mut add_category = Box::new(AddCategory::new(category_id, name, self.ruleset_tag, self.draw_tag));
            add_category.apply(tournament)?;
            self.created_categories.push(category_id);
            self.children.push(add_category);

            let mut add_players = Box::new(AddPlayersToCategory::new(category_id, group_players, self.seed));
            add_players.apply(tournament)?;
            self.children.push(add_players);
        }

        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        undo_children(&mut self.children, tournament);
        self.created_categories.clear();
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(AutoAddCategories::new(
            self.players.clone(),
            self.base_name.clone(),
            self.max_difference_percent,
            self.max_size,
            self.ruleset_tag,
            self.draw_tag,
            self.salt,
            self.seed,
        ))
    }

    fn description(&self) -> String {
        format!("auto-add categories from {} players", self.players.len())
    }

    fn tag(&self) -> ActionTag {
        ActionTag::AutoAddCategories
    }
}
