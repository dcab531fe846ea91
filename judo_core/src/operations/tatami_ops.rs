//! Tatami count and placement actions, grounded on
//! `original_source/core/actions/tatami_actions.cpp`.

use crate::draw::draw_system_for_tag;
use crate::error::ActionError;
use crate::identifiers::CategoryId;
use crate::matches::MatchType;
use crate::operations::{Action, ActionTag, ApplyOutcome};
use crate::tatami::{Block, BlockLocation, PositionHandle, Tatami, MAX_GROUP_COUNT};
use crate::tournament::Tournament;

/// Grows the list by appending fresh tatami handles inside a paired
/// `beginAddTatamis`/`endAddTatamis` scope, or shrinks by detaching and
/// saving tatamis from the tail inside `beginEraseTatamis`/
/// `endEraseTatamis`; removed tatamis have all their categories'
/// locations cleared to `None` so the reverse link stays consistent.
/// Undo reinserts saved tatamis by remembered handle and restores each
/// category's location.
pub struct SetTatamiCount {
    pub target: usize,
    added: Vec<PositionHandle<crate::identifiers::TatamiMarker>>,
    erased: Vec<(PositionHandle<crate::identifiers::TatamiMarker>, Tatami)>,
    cleared_locations: Vec<(CategoryId, MatchType, BlockLocation)>,
}

impl SetTatamiCount {
    pub fn new(target: usize) -> Self {
        SetTatamiCount {
            target,
            added: Vec::new(),
            erased: Vec::new(),
            cleared_locations: Vec::new(),
        }
    }
}

impl Action for SetTatamiCount {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let current = tournament.tatamis.tatamis.len();
        if self.target > current {
            tournament.begin_add_tatamis()?;
            for i in current..self.target {
                let handle = tournament.tatamis.generate_location(i);
                tournament.tatamis.tatamis.get(handle);
                self.added.push(handle);
            }
            tournament.end_add_tatamis();
        } else if self.target < current {
            tournament.begin_erase_tatamis()?;
            for i in (self.target..current).rev() {
                let Some(handle) = tournament.tatamis.tatamis.get_handle(i) else {
                    continue;
                };
                for (cat_id, category) in tournament.categories.iter_mut() {
                    let mut cleared = Vec::new();
                    for (match_type, location) in category.locations.iter() {
                        if location.tatami.id == handle.id {
                            cleared.push((*match_type, *location));
                        }
                    }
                    for (match_type, location) in cleared {
                        category.locations.remove(&match_type);
                        self.cleared_locations.push((*cat_id, match_type, location));
                    }
                }
                if let Some(tatami) = tournament.tatamis.tatamis.erase(handle) {
                    self.erased.push((handle, tatami));
                }
            }
            tournament.end_erase_tatamis();
        }
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        for handle in self.added.drain(..) {
            tournament.tatamis.tatamis.erase(handle);
        }
        while let Some((handle, tatami)) = self.erased.pop() {
            tournament.tatamis.tatamis.insert_at(handle.index, handle.id, tatami);
        }
        for (cat_id, match_type, location) in self.cleared_locations.drain(..) {
            if let Some(category) = tournament.categories.get_mut(&cat_id) {
                category.locations.insert(match_type, location);
            }
        }
        tournament.notify_tatamis_changed();
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(SetTatamiCount::new(self.target))
    }

    fn description(&self) -> String {
        format!("set tatami count to {}", self.target)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::SetTatamiCount
    }
}

/// Validates the category exists, the target tatami exists, the block
/// type is appropriate for the draw system (FINAL only if
/// `has_final_block`), and the destination concurrent group would not
/// exceed `MAX_GROUP_COUNT`. On success, moves the block and records the
/// prior location.
pub struct SetTatamiLocation {
    pub category: CategoryId,
    pub match_type: MatchType,
    pub target: Option<BlockLocation>,
    prior: Option<Option<BlockLocation>>,
}

impl SetTatamiLocation {
    pub fn new(category: CategoryId, match_type: MatchType, target: Option<BlockLocation>) -> Self {
        SetTatamiLocation {
            category,
            match_type,
            target,
            prior: None,
        }
    }
}

impl Action for SetTatamiLocation {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        let category = tournament.category(self.category)?;
        let draw = draw_system_for_tag(category.draw_tag)?;
        if self.match_type == MatchType::Final && !draw.has_final_block() {
            return Err(ActionError::FinalBlockUnsupported);
        }

        if let Some(target) = self.target {
            if tournament.tatamis.tatamis.try_get(target.tatami.id).is_none() {
                return Err(ActionError::UnknownTatami(target.tatami.id));
            }
            if tournament.tatamis.group_size_at(target) + 1 > MAX_GROUP_COUNT {
                return Err(ActionError::GroupCapacityExceeded);
            }
        }

        let prior = tournament.categories[&self.category].locations.get(&self.match_type).copied();
        let block = Block {
            category: Some(self.category),
            match_type: Some(self.match_type),
        };
        tournament.tatamis.move_block(block, prior, self.target);

        let category = tournament.categories.get_mut(&self.category).unwrap();
        match self.target {
            Some(loc) => {
                category.locations.insert(self.match_type, loc);
            }
            None => {
                category.locations.remove(&self.match_type);
            }
        }
        self.prior = Some(prior);
        tournament.notify_categories_changed();
        tournament.notify_tatamis_changed();
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        let Some(prior) = self.prior.take() else {
            return;
        };
        let block = Block {
            category: Some(self.category),
            match_type: Some(self.match_type),
        };
        tournament.tatamis.move_block(block, self.target, prior);
        if let Some(category) = tournament.categories.get_mut(&self.category) {
            match prior {
                Some(loc) => {
                    category.locations.insert(self.match_type, loc);
                }
                None => {
                    category.locations.remove(&self.match_type);
                }
            }
        }
        tournament.notify_categories_changed();
        tournament.notify_tatamis_changed();
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(SetTatamiLocation::new(self.category, self.match_type, self.target))
    }

    fn description(&self) -> String {
        format!("set tatami location for category {} block {:?}", self.category, self.match_type)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::SetTatamiLocation
    }
}
