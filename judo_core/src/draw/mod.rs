//! Draw systems: given a player list, produce the initial match
//! schedule; given a finished match, produce follow-up actions. A small
//! closed set addressed by integer tag, mirroring
//! `squire_lib::tournament::pairing_system_factory`'s table-lookup-by-enum
//! shape rather than open dynamic registration.

pub mod double_pool;
pub mod knockout;
pub mod pool;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::identifiers::{CategoryId, PlayerId};
use crate::operations::match_ops::AddMatch;
use crate::operations::Action;
use crate::tournament::Tournament;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawTag(pub u8);

impl DrawTag {
    pub const POOL: DrawTag = DrawTag(0);
    pub const KNOCKOUT: DrawTag = DrawTag(1);
    pub const DOUBLE_POOL: DrawTag = DrawTag(2);
}

pub trait DrawSystem: Send + Sync {
    fn tag(&self) -> DrawTag;
    fn name(&self) -> &'static str;

    /// Whether this draw system schedules a distinct FINAL block.
    /// `SetTatamiLocation` validation references this.
    fn has_final_block(&self) -> bool;

    fn clone_boxed(&self) -> Box<dyn DrawSystem>;

    fn init_category(
        &self,
        tournament: &Tournament,
        category: CategoryId,
        player_ids: &[PlayerId],
        seed: u64,
    ) -> Vec<AddMatch>;

    fn update_category(&self, tournament: &Tournament, category: CategoryId) -> Vec<Box<dyn Action>>;

    /// `(rank, playerId)` pairs; `rank` is `None` for players who never
    /// played.
    fn get_results(&self, tournament: &Tournament, category: CategoryId) -> Vec<(Option<u32>, PlayerId)>;

    fn is_finished(&self, tournament: &Tournament, category: CategoryId) -> bool;
}

impl Clone for Box<dyn DrawSystem> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

pub fn draw_system_for_tag(tag: DrawTag) -> Result<Box<dyn DrawSystem>, ActionError> {
    match tag {
        DrawTag::POOL => Ok(Box::new(pool::PoolDraw)),
        DrawTag::KNOCKOUT => Ok(Box::new(knockout::KnockoutDraw)),
        DrawTag::DOUBLE_POOL => Ok(Box::new(double_pool::DoublePoolDraw)),
        DrawTag(n) => Err(ActionError::DrawTagOutOfRange(n)),
    }
}
