//! Single-elimination knockout draw, grounded on
//! `original_source/core/draw_systems/knockout_draw_system.cpp`.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::draw::{DrawSystem, DrawTag};
use crate::identifiers::{id_from_list, CategoryId, PlayerId};
use crate::matches::MatchType;
use crate::operations::match_ops::{AddMatch, SetMatchPlayer};
use crate::operations::Action;
use crate::ruleset::ruleset_for_tag;
use crate::tournament::Tournament;

#[derive(Debug, Clone, Copy, Default)]
pub struct KnockoutDraw;

fn leaf_count(player_count: usize) -> usize {
    let target = ((player_count + 1) / 2) * 2;
    let mut leaves = 2usize;
    while leaves < target {
        leaves *= 2;
    }
    leaves
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Named the way `knockout_draw_system.cpp::matchTitle` does: counting
/// backward from the final ("Final", "Semi-Final", "Quarter-Final"), then
/// forward from the shallow end ("1st Round", "2nd Round", ...) once the
/// bracket is too deep for a named stage.
fn match_title(round: usize, rounds: usize) -> String {
    let depth_from_final = rounds - 1 - round;
    match depth_from_final {
        0 => "Final".to_string(),
        1 => "Semi-Final".to_string(),
        2 => "Quarter-Final".to_string(),
        _ => format!("{} Round", ordinal(round + 1)),
    }
}

/// Round layout derived from the category's total knockout match count
/// (`leaves - 1`), since the tree shape isn't stored separately from the
/// flat, creation-ordered match list.
struct RoundLayout {
    rounds: usize,
    /// `(offset, size)` into the category's `matches` vec, per round,
    /// round 0 = shallowest.
    offsets: Vec<(usize, usize)>,
}

fn layout_for(total_matches: usize) -> Option<RoundLayout> {
    if total_matches == 0 {
        return None;
    }
    let leaves = total_matches + 1;
    let rounds = leaves.trailing_zeros() as usize;
    let mut offsets = Vec::with_capacity(rounds);
    let mut offset = 0;
    let mut size = leaves / 2;
    for _ in 0..rounds {
        offsets.push((offset, size));
        offset += size;
        size /= 2;
    }
    Some(RoundLayout { rounds, offsets })
}

impl DrawSystem for KnockoutDraw {
    fn tag(&self) -> DrawTag {
        DrawTag::KNOCKOUT
    }

    fn name(&self) -> &'static str {
        "Knockout"
    }

    fn has_final_block(&self) -> bool {
        true
    }

    fn clone_boxed(&self) -> Box<dyn DrawSystem> {
        Box::new(*self)
    }

    fn init_category(
        &self,
        tournament: &Tournament,
        category: CategoryId,
        player_ids: &[PlayerId],
        seed: u64,
    ) -> Vec<AddMatch> {
        let mut shuffled = player_ids.to_vec();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        let leaves = leaf_count(shuffled.len());
        let rounds = leaves.trailing_zeros() as usize;
        let byes_needed = leaves - shuffled.len();

        // Bye placement: odd indices first, then even, draining the
        // shuffled player list into the remaining leaf slots.
        let mut bye_slot = vec![false; leaves];
        let mut remaining_byes = byes_needed;
        for i in (1..leaves).step_by(2) {
            if remaining_byes == 0 {
                break;
            }
            bye_slot[i] = true;
            remaining_byes -= 1;
        }
        for i in (0..leaves).step_by(2) {
            if remaining_byes == 0 {
                break;
            }
            bye_slot[i] = true;
            remaining_byes -= 1;
        }

        let mut players_iter = shuffled.into_iter();
        let mut current_layer: Vec<Option<PlayerId>> = (0..leaves)
            .map(|i| if bye_slot[i] { None } else { players_iter.next() })
            .collect();

        // Only round 0 (the leaves) can know its players at creation time;
        // every later round starts with both slots empty and is wired in by
        // `update_category` once its predecessors are decided, so a match
        // with exactly one real opponent still pending is never mistaken
        // for a genuine bye.
        let mut matches = Vec::new();
        for round in 0..rounds {
            let layer_size = current_layer.len();
            let is_final_type = round + 2 >= rounds;
            let match_type = if is_final_type {
                MatchType::Final
            } else {
                MatchType::Knockout
            };
            let title = match_title(round, rounds);
            for m in 0..layer_size / 2 {
                let (white, blue) = if round == 0 {
                    (current_layer[2 * m], current_layer[2 * m + 1])
                } else {
                    (None, None)
                };
                let seed_key = (category.as_uuid(), round as u64, m as u64);
                let id = id_from_list(tournament.salt, [
                    seed_key.0.as_u128() as u64,
                    seed_key.1,
                    seed_key.2,
                ]);
                matches.push(AddMatch::with_bye_eligibility(
                    id,
                    category,
                    match_type,
                    title.clone(),
                    white,
                    blue,
                    round == 0,
                ));
            }
            current_layer = vec![None; layer_size / 2];
        }
        matches
    }

    /// Walks round by round from the shallow end, wiring each unfinished
    /// non-bye match's empty slot from its finished predecessor's winner.
    /// Stops at the first round where nothing changed.
    fn update_category(&self, tournament: &Tournament, category: CategoryId) -> Vec<Box<dyn Action>> {
        let mut actions: Vec<Box<dyn Action>> = Vec::new();
        let Ok(cat) = tournament.category(category) else {
            return actions;
        };
        let Some(layout) = layout_for(cat.matches.len()) else {
            return actions;
        };
        let Ok(ruleset) = ruleset_for_tag(cat.ruleset_tag) else {
            return actions;
        };

        // A BYE's sole player advances without a score to compare, so its
        // "winner" comes straight from the one filled slot rather than
        // `Ruleset::winner`, which only resolves matches that were actually
        // scored.
        let predecessor_winner = |pred: &crate::matches::Match| -> Option<PlayerId> {
            if pred.bye {
                pred.white_player.or(pred.blue_player)
            } else {
                ruleset.winner(&pred.state).and_then(|s| pred.player(s))
            }
        };

        for round in 1..layout.rounds {
            let (offset, size) = layout.offsets[round];
            let (prev_offset, _) = layout.offsets[round - 1];
            let mut changed = false;
            for m in 0..size {
                let match_id = cat.matches[offset + m];
                let Ok(cur) = tournament.match_by_id(match_id) else {
                    continue;
                };
                let white_pred_id = cat.matches[prev_offset + 2 * m];
                let blue_pred_id = cat.matches[prev_offset + 2 * m + 1];

                if cur.white_player.is_none() {
                    if let Ok(pred) = tournament.match_by_id(white_pred_id) {
                        if pred.is_finished() {
                            if let Some(winner) = predecessor_winner(pred) {
                                actions.push(Box::new(SetMatchPlayer::new(
                                    category,
                                    match_id,
                                    crate::matches::Side::White,
                                    Some(winner),
                                )));
                                changed = true;
                            }
                        }
                    }
                }
                if cur.blue_player.is_none() {
                    if let Ok(pred) = tournament.match_by_id(blue_pred_id) {
                        if pred.is_finished() {
                            if let Some(winner) = predecessor_winner(pred) {
                                actions.push(Box::new(SetMatchPlayer::new(
                                    category,
                                    match_id,
                                    crate::matches::Side::Blue,
                                    Some(winner),
                                )));
                                changed = true;
                            }
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
        actions
    }

    fn get_results(&self, tournament: &Tournament, category: CategoryId) -> Vec<(Option<u32>, PlayerId)> {
        let Ok(cat) = tournament.category(category) else {
            return Vec::new();
        };
        if !self.is_finished(tournament, category) {
            return cat.players.iter().map(|p| (None, *p)).collect();
        }
        let Some(layout) = layout_for(cat.matches.len()) else {
            return cat.players.iter().map(|p| (None, *p)).collect();
        };
        let Ok(ruleset) = ruleset_for_tag(cat.ruleset_tag) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let (final_offset, _) = layout.offsets[layout.rounds - 1];
        let final_id = cat.matches[final_offset];
        let Ok(final_match) = tournament.match_by_id(final_id) else {
            return results;
        };
        if let Some(winner_side) = ruleset.winner(&final_match.state) {
            if let Some(p) = final_match.player(winner_side) {
                results.push((Some(1), p));
            }
            if let Some(p) = final_match.player(winner_side.other()) {
                results.push((Some(2), p));
            }
        }

        let mut position_start: u32 = 3;
        for round in (0..layout.rounds - 1).rev() {
            let (offset, size) = layout.offsets[round];
            let mut losers = Vec::new();
            for m in 0..size {
                let match_id = cat.matches[offset + m];
                let Ok(mm) = tournament.match_by_id(match_id) else {
                    continue;
                };
                if mm.bye {
                    continue;
                }
                if let Some(winner_side) = ruleset.winner(&mm.state) {
                    if let Some(p) = mm.player(winner_side.other()) {
                        losers.push(p);
                    }
                }
            }
            for (i, p) in losers.into_iter().enumerate() {
                results.push((Some(position_start + i as u32), p));
            }
            position_start += size as u32;
        }
        results
    }

    fn is_finished(&self, tournament: &Tournament, category: CategoryId) -> bool {
        let Ok(cat) = tournament.category(category) else {
            return false;
        };
        let knockout_counts = cat.counts_for(MatchType::Knockout);
        let final_counts = cat.counts_for(MatchType::Final);
        knockout_counts.not_started == 0
            && knockout_counts.started == 0
            && final_counts.not_started == 0
            && final_counts.started == 0
            && !cat.matches.is_empty()
    }
}
