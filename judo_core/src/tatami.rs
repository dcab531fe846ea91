//! Tatami layout: a positional tree of tatami → concurrent group →
//! sequential group → block, addressed by stable handles that survive
//! undo/redo without renumbering siblings.
//!
//! Grounded on `original_source/position_manager.hpp`: lookup is O(1) by
//! id; on a miss (the handle's id was erased, then undo wants it back) the
//! id is reinserted at `min(current_len, handle.index)`, clamped so it
//! never goes out of bounds, and a fresh default element is created there.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::identifiers::{
    CategoryId, ConcurrentGroupMarker, Id, SequentialGroupMarker, TatamiMarker,
};
use crate::matches::MatchStatus;
use crate::matches::MatchType;

/// Matches within one concurrent group may not exceed this count, per
/// the tatami invariant.
pub const MAX_GROUP_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionHandle<Marker> {
    pub id: Id<Marker>,
    pub index: usize,
}

/// An ordered list of ids plus a mapping id→data. `erase` removes from the
/// list; a later `get` on the erased handle reinserts the id at the
/// remembered (clamped) index instead of appending, so undo restores a
/// deleted group to its original slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionManager<Marker, T> {
    ids: Vec<Id<Marker>>,
    elements: HashMap<Id<Marker>, T>,
}

impl<Marker, T> Default for PositionManager<Marker, T> {
    fn default() -> Self {
        PositionManager {
            ids: Vec::new(),
            elements: HashMap::new(),
        }
    }
}

impl<Marker, T> PositionManager<Marker, T>
where
    Marker: Copy,
    T: Default,
{
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[Id<Marker>] {
        &self.ids
    }

    pub fn get_handle(&self, index: usize) -> Option<PositionHandle<Marker>> {
        self.ids.get(index).map(|id| PositionHandle { id: *id, index })
    }

    pub fn get(&mut self, handle: PositionHandle<Marker>) -> &mut T {
        if !self.elements.contains_key(&handle.id) {
            let at = handle.index.min(self.ids.len());
            self.ids.insert(at, handle.id);
            self.elements.insert(handle.id, T::default());
        }
        self.elements.get_mut(&handle.id).expect("just inserted")
    }

    pub fn try_get(&self, id: Id<Marker>) -> Option<&T> {
        self.elements.get(&id)
    }

    /// Inserts a brand-new id at `index`, used when a caller already has
    /// fresh data to place (rather than wanting a lazily-defaulted slot).
    pub fn insert_at(&mut self, index: usize, id: Id<Marker>, value: T) {
        let at = index.min(self.ids.len());
        self.ids.insert(at, id);
        self.elements.insert(id, value);
    }

    pub fn erase(&mut self, handle: PositionHandle<Marker>) -> Option<T> {
        if let Some(pos) = self.ids.iter().position(|id| *id == handle.id) {
            self.ids.remove(pos);
        }
        self.elements.remove(&handle.id)
    }

    pub fn position_of(&self, id: Id<Marker>) -> Option<usize> {
        self.ids.iter().position(|candidate| *candidate == id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStatusCounts {
    pub not_started: usize,
    pub started: usize,
    pub finished: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub category: Option<CategoryId>,
    pub match_type: Option<MatchType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequentialGroup {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrentGroup {
    pub sequential_groups: PositionManager<SequentialGroupMarker, SequentialGroup>,
    pub status: GroupStatusCounts,
}

impl ConcurrentGroup {
    pub fn block_count(&self) -> usize {
        self.sequential_groups
            .ids()
            .iter()
            .filter_map(|id| self.sequential_groups.try_get(*id))
            .map(|seq| seq.blocks.len())
            .sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tatami {
    pub concurrent_groups: PositionManager<ConcurrentGroupMarker, ConcurrentGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TatamiList {
    pub tatamis: PositionManager<TatamiMarker, Tatami>,
}

/// The full address of a block: which tatami, which concurrent group,
/// which sequential group, and its index within that sequential group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    pub tatami: PositionHandle<TatamiMarker>,
    pub concurrent_group: PositionHandle<ConcurrentGroupMarker>,
    pub sequential_group: PositionHandle<SequentialGroupMarker>,
    pub block_index: usize,
}

impl TatamiList {
    pub fn generate_location(&self, i: usize) -> PositionHandle<TatamiMarker> {
        PositionHandle {
            id: Id::new(uuid::Uuid::new_v4()),
            index: i,
        }
    }

    /// Moves (or inserts, or removes) a block. Creates the sequential
    /// group if absent, the concurrent group if absent; destroys either
    /// when it becomes empty, retaining the handle for undo.
    pub fn move_block(&mut self, block: Block, from: Option<BlockLocation>, to: Option<BlockLocation>) {
        if let Some(loc) = from {
            self.remove_block_at(loc);
        }
        if let Some(loc) = to {
            self.insert_block_at(loc, block);
        }
    }

    fn insert_block_at(&mut self, loc: BlockLocation, block: Block) {
        let tatami = self.tatamis.get(loc.tatami);
        let group = tatami.concurrent_groups.get(loc.concurrent_group);
        let seq = group.sequential_groups.get(loc.sequential_group);
        let at = loc.block_index.min(seq.blocks.len());
        seq.blocks.insert(at, block);
    }

    fn remove_block_at(&mut self, loc: BlockLocation) {
        let tatami = self.tatamis.get(loc.tatami);
        let group = tatami.concurrent_groups.get(loc.concurrent_group);
        let seq = group.sequential_groups.get(loc.sequential_group);
        if loc.block_index < seq.blocks.len() {
            seq.blocks.remove(loc.block_index);
        }
        if seq.blocks.is_empty() {
            group.sequential_groups.erase(loc.sequential_group);
        }
        if group.sequential_groups.is_empty() {
            tatami.concurrent_groups.erase(loc.concurrent_group);
        }
    }

    /// Revisits the block's owning concurrent group and recomputes its
    /// aggregated status counts from `statuses` (one per match currently
    /// occupying that group's blocks).
    pub fn recompute_group(&mut self, loc: BlockLocation, statuses: &[MatchStatus]) {
        let tatami = self.tatamis.get(loc.tatami);
        let group = tatami.concurrent_groups.get(loc.concurrent_group);
        let mut counts = GroupStatusCounts::default();
        for status in statuses {
            match status {
                MatchStatus::NotStarted => counts.not_started += 1,
                MatchStatus::Paused | MatchStatus::Unpaused => counts.started += 1,
                MatchStatus::Finished => counts.finished += 1,
            }
        }
        group.status = counts;
    }

    /// Current size of the concurrent group at `loc`, used to enforce
    /// `MAX_GROUP_COUNT` before a move.
    pub fn group_size_at(&mut self, loc: BlockLocation) -> usize {
        let tatami = self.tatamis.get(loc.tatami);
        tatami
            .concurrent_groups
            .try_get(loc.concurrent_group.id)
            .map(ConcurrentGroup::block_count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_then_get_reinserts_at_clamped_index() {
        let mut pm: PositionManager<TatamiMarker, Tatami> = PositionManager::default();
        let id0 = Id::new(uuid::Uuid::new_v4());
        pm.get(PositionHandle { id: id0, index: 0 });
        let h0 = pm.get_handle(0).unwrap();
        assert_eq!(pm.len(), 1);
        pm.erase(h0);
        assert_eq!(pm.len(), 0);
        pm.get(h0);
        assert_eq!(pm.len(), 1);
        assert_eq!(pm.get_handle(0).unwrap().id, h0.id);
    }

    #[test]
    fn erase_then_get_clamps_when_list_shrank() {
        let mut pm: PositionManager<TatamiMarker, Tatami> = PositionManager::default();
        let ids: Vec<_> = (0..3)
            .map(|i| {
                let id = Id::new(uuid::Uuid::new_v4());
                pm.get(PositionHandle { id, index: i });
                id
            })
            .collect();
        let handle_at_2 = PositionHandle { id: ids[2], index: 2 };
        pm.erase(handle_at_2);
        pm.erase(PositionHandle { id: ids[1], index: 1 });
        assert_eq!(pm.len(), 1);
        pm.get(handle_at_2);
        assert_eq!(pm.len(), 2);
        assert_eq!(pm.get_handle(1).unwrap().id, ids[2]);
    }
}
