//! Composite actions: an internal stack of child actions applied in
//! order and undone in reverse.

use crate::draw::DrawTag;
use crate::error::ActionError;
use crate::identifiers::CategoryId;
use crate::operations::category_ops::DrawCategory;
use crate::operations::{Action, ActionTag, ApplyOutcome};
use crate::ruleset::RulesetTag;
use crate::tournament::Tournament;

/// A generic ordered bundle of actions, applied front-to-back and undone
/// back-to-front. Used for user-level operations that don't need a
/// bespoke struct of their own.
pub struct CompositeAction {
    label: String,
    steps: Vec<Box<dyn Action>>,
    applied: usize,
}

impl CompositeAction {
    pub fn new(label: impl Into<String>, steps: Vec<Box<dyn Action>>) -> Self {
        CompositeAction {
            label: label.into(),
            steps,
            applied: 0,
        }
    }
}

impl Action for CompositeAction {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        for step in self.steps.iter_mut().skip(self.applied) {
            step.apply(tournament)?;
            self.applied += 1;
        }
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        while self.applied > 0 {
            self.applied -= 1;
            self.steps[self.applied].undo(tournament);
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(CompositeAction::new(
            self.label.clone(),
            self.steps.iter().map(|s| s.fresh_clone()).collect(),
        ))
    }

    fn description(&self) -> String {
        self.label.clone()
    }

    fn tag(&self) -> ActionTag {
        // Composite actions persist as their constituent steps; this tag
        // is only used for in-memory description purposes.
        ActionTag::DrawCategory
    }
}

/// Changes both a category's ruleset and its draw system as a single user
/// operation, dispatching exactly one coalesced [`DrawCategory`] rather
/// than the double reset that dispatching each field change separately
/// would cause (an open question resolved in DESIGN.md).
pub struct ChangeCategoryRulesetAndDraw {
    pub category: CategoryId,
    pub ruleset_tag: RulesetTag,
    pub draw_tag: DrawTag,
    pub seed: u64,
    prior_ruleset: Option<RulesetTag>,
    prior_draw: Option<DrawTag>,
    draw_child: Option<Box<dyn Action>>,
}

impl ChangeCategoryRulesetAndDraw {
    pub fn new(category: CategoryId, ruleset_tag: RulesetTag, draw_tag: DrawTag, seed: u64) -> Self {
        ChangeCategoryRulesetAndDraw {
            category,
            ruleset_tag,
            draw_tag,
            seed,
            prior_ruleset: None,
            prior_draw: None,
            draw_child: None,
        }
    }
}

impl Action for ChangeCategoryRulesetAndDraw {
    fn apply(&mut self, tournament: &mut Tournament) -> Result<ApplyOutcome, ActionError> {
        crate::ruleset::ruleset_for_tag(self.ruleset_tag)?;
        crate::draw::draw_system_for_tag(self.draw_tag)?;
        let category = tournament
            .categories
            .get_mut(&self.category)
            .ok_or(ActionError::UnknownCategory(self.category))?;
        self.prior_ruleset = Some(std::mem::replace(&mut category.ruleset_tag, self.ruleset_tag));
        self.prior_draw = Some(std::mem::replace(&mut category.draw_tag, self.draw_tag));

        let mut draw = Box::new(DrawCategory::new(self.category, self.seed));
        draw.apply(tournament)?;
        self.draw_child = Some(draw);
        Ok(ApplyOutcome::Applied)
    }

    fn undo(&mut self, tournament: &mut Tournament) {
        if let Some(mut child) = self.draw_child.take() {
            child.undo(tournament);
        }
        if let (Some(ruleset), Some(draw)) = (self.prior_ruleset.take(), self.prior_draw.take()) {
            if let Some(category) = tournament.categories.get_mut(&self.category) {
                category.ruleset_tag = ruleset;
                category.draw_tag = draw;
            }
        }
    }

    fn fresh_clone(&self) -> Box<dyn Action> {
        Box::new(ChangeCategoryRulesetAndDraw::new(
            self.category,
            self.ruleset_tag,
            self.draw_tag,
            self.seed,
        ))
    }

    fn description(&self) -> String {
        format!("change category {} ruleset and draw system", self.category)
    }

    fn tag(&self) -> ActionTag {
        ActionTag::ChangeCategoryDrawSystem
    }
}

// Re-exported for callers that still want the two single-field actions
// available individually (e.g. UI-driven single-field edits where only
// one of the two is changing).
pub use crate::operations::category_ops::{ChangeCategoryDrawSystem as DrawSystemOnly, ChangeCategoryRuleset as RulesetOnly};
