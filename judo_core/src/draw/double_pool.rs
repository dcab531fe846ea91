//! Double-pool draw, grounded on
//! `original_source/core/draw_systems/double_pool_draw_system.cpp`.
//! Splits the field into two pools, runs both
//! in parallel, then wires two semi-finals and a final from the pool
//! results once every pool match has finished.
//!
//! Pool membership for a match is recovered at `update_category` time
//! from its title prefix ("Pool A"/"Pool B") rather than from a second
//! stored index, since the category's match list carries no field for it;
//! this mirrors how the original keeps each sub-`PoolDrawSystem`'s match
//! list private and only exposes aggregate results upward.

use std::collections::{BinaryHeap, HashMap};
use std::cmp::Reverse;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::draw::pool::round_robin_schedule;
use crate::draw::{DrawSystem, DrawTag};
use crate::identifiers::{id_from_list, CategoryId, PlayerId};
use crate::matches::{MatchType, Side};
use crate::operations::match_ops::{AddMatch, SetMatchPlayer};
use crate::operations::Action;
use crate::ruleset::ruleset_for_tag;
use crate::tournament::Tournament;

#[derive(Debug, Clone, Copy, Default)]
pub struct DoublePoolDraw;

const SEMI_A_TITLE: &str = "Semi-Final 1";
const SEMI_B_TITLE: &str = "Semi-Final 2";
const FINAL_TITLE: &str = "Final";

fn pool_schedule_titled(prefix: &str, players: &[PlayerId]) -> Vec<(String, PlayerId, PlayerId)> {
    round_robin_schedule(players)
        .into_iter()
        .enumerate()
        .map(|(i, (w, b))| (format!("{prefix} Match {}", i + 1), w, b))
        .collect()
}

fn pool_top_two(
    tournament: &Tournament,
    category: CategoryId,
    prefix: &str,
) -> Vec<PlayerId> {
    let Ok(cat) = tournament.category(category) else {
        return Vec::new();
    };
    let Ok(ruleset) = ruleset_for_tag(cat.ruleset_tag) else {
        return Vec::new();
    };
    let mut wins: HashMap<PlayerId, u32> = HashMap::new();
    let mut players = Vec::new();
    for match_id in &cat.matches {
        let Ok(m) = tournament.match_by_id(*match_id) else {
            continue;
        };
        if !m.title.starts_with(prefix) {
            continue;
        }
        for p in [m.white_player, m.blue_player].into_iter().flatten() {
            if !players.contains(&p) {
                players.push(p);
            }
            wins.entry(p).or_insert(0);
        }
        if let Some(winner_side) = ruleset.winner(&m.state) {
            if let Some(p) = m.player(winner_side) {
                *wins.entry(p).or_default() += 1;
            }
        }
    }
    players.sort_by_key(|p| std::cmp::Reverse(wins.get(p).copied().unwrap_or(0)));
    players
}

impl DrawSystem for DoublePoolDraw {
    fn tag(&self) -> DrawTag {
        DrawTag::DOUBLE_POOL
    }

    fn name(&self) -> &'static str {
        "Double Pool"
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

        let mid = shuffled.len() / 2;
        let (pool_a_players, pool_b_players) = shuffled.split_at(mid);

        let pool_a = pool_schedule_titled("Pool A", pool_a_players);
        let pool_b = pool_schedule_titled("Pool B", pool_b_players);

        // Interleave the two pools' match lists via a min-heap keyed on
        // each pool's local index, so a single tatami sees a balanced
        // alternation rather than pool A run to completion first.
        let mut heap: BinaryHeap<Reverse<(usize, u8, usize)>> = BinaryHeap::new();
        for i in 0..pool_a.len() {
            heap.push(Reverse((i, 0, i)));
        }
        for i in 0..pool_b.len() {
            heap.push(Reverse((i, 1, i)));
        }

        let mut matches = Vec::new();
        while let Some(Reverse((_, pool_tag, idx))) = heap.pop() {
            let (title, white, blue) = if pool_tag == 0 {
                pool_a[idx].clone()
            } else {
                pool_b[idx].clone()
            };
            let id = id_from_list(tournament.salt, [
                category.as_uuid().as_u128() as u64,
                pool_tag as u64,
                idx as u64,
            ]);
            matches.push(AddMatch::new(id, category, MatchType::Final, title, Some(white), Some(blue)));
        }

        let semi_a_id = id_from_list(tournament.salt, [category.as_uuid().as_u128() as u64, 9001u64]);
        let semi_b_id = id_from_list(tournament.salt, [category.as_uuid().as_u128() as u64, 9002u64]);
        let final_id = id_from_list(tournament.salt, [category.as_uuid().as_u128() as u64, 9003u64]);
        matches.push(AddMatch::new(semi_a_id, category, MatchType::Final, SEMI_A_TITLE.to_string(), None, None));
        matches.push(AddMatch::new(semi_b_id, category, MatchType::Final, SEMI_B_TITLE.to_string(), None, None));
        matches.push(AddMatch::new(final_id, category, MatchType::Final, FINAL_TITLE.to_string(), None, None));

        matches
    }

    fn update_category(&self, tournament: &Tournament, category: CategoryId) -> Vec<Box<dyn Action>> {
        let mut actions: Vec<Box<dyn Action>> = Vec::new();
        let Ok(cat) = tournament.category(category) else {
            return actions;
        };
        if cat.matches.len() < 3 {
            return actions;
        }
        let pool_matches = &cat.matches[..cat.matches.len() - 3];
        let elimination_finished = pool_matches
            .iter()
            .all(|id| tournament.match_by_id(*id).map(|m| m.is_finished()).unwrap_or(false));

        let find_by_title = |title: &str| -> Option<crate::identifiers::MatchId> {
            cat.matches.iter().copied().find(|id| {
                tournament
                    .match_by_id(*id)
                    .map(|m| m.title == title)
                    .unwrap_or(false)
            })
        };
        let Some(semi_a) = find_by_title(SEMI_A_TITLE) else {
            return actions;
        };
        let Some(semi_b) = find_by_title(SEMI_B_TITLE) else {
            return actions;
        };
        let Some(final_match) = find_by_title(FINAL_TITLE) else {
            return actions;
        };

        let wire = |match_id, side, target: Option<PlayerId>, actions: &mut Vec<Box<dyn Action>>| {
            let current = tournament.match_by_id(match_id).ok().and_then(|m| m.player(side));
            if current != target {
                actions.push(Box::new(SetMatchPlayer::new(category, match_id, side, target)) as Box<dyn Action>);
            }
        };

        if !elimination_finished {
            wire(semi_a, Side::White, None, &mut actions);
            wire(semi_a, Side::Blue, None, &mut actions);
            wire(semi_b, Side::White, None, &mut actions);
            wire(semi_b, Side::Blue, None, &mut actions);
            wire(final_match, Side::White, None, &mut actions);
            wire(final_match, Side::Blue, None, &mut actions);
            return actions;
        }

        let pool_a_ranked = pool_top_two(tournament, category, "Pool A");
        let pool_b_ranked = pool_top_two(tournament, category, "Pool B");

        wire(semi_a, Side::White, pool_a_ranked.first().copied(), &mut actions);
        wire(semi_a, Side::Blue, pool_b_ranked.get(1).copied(), &mut actions);
        wire(semi_b, Side::White, pool_b_ranked.first().copied(), &mut actions);
        wire(semi_b, Side::Blue, pool_a_ranked.get(1).copied(), &mut actions);

        let Ok(cat) = tournament.category(category) else {
            return actions;
        };
        let Ok(ruleset) = ruleset_for_tag(cat.ruleset_tag) else {
            return actions;
        };
        let semi_a_winner = tournament.match_by_id(semi_a).ok().filter(|m| m.is_finished())
            .and_then(|m| ruleset.winner(&m.state).and_then(|s| m.player(s)));
        let semi_b_winner = tournament.match_by_id(semi_b).ok().filter(|m| m.is_finished())
            .and_then(|m| ruleset.winner(&m.state).and_then(|s| m.player(s)));
        wire(final_match, Side::White, semi_a_winner, &mut actions);
        wire(final_match, Side::Blue, semi_b_winner, &mut actions);

        actions
    }

    fn get_results(&self, tournament: &Tournament, category: CategoryId) -> Vec<(Option<u32>, PlayerId)> {
        let Ok(cat) = tournament.category(category) else {
            return Vec::new();
        };
        if !self.is_finished(tournament, category) {
            return cat.players.iter().map(|p| (None, *p)).collect();
        }
        let final_id = cat.matches.iter().copied().find(|id| {
            tournament.match_by_id(*id).map(|m| m.title == FINAL_TITLE).unwrap_or(false)
        });
        let Some(final_id) = final_id else {
            return Vec::new();
        };
        let Ok(ruleset) = ruleset_for_tag(cat.ruleset_tag) else {
            return Vec::new();
        };
        let Ok(final_match) = tournament.match_by_id(final_id) else {
            return Vec::new();
        };
        let mut results = Vec::new();
        if let Some(winner_side) = ruleset.winner(&final_match.state) {
            if let Some(p) = final_match.player(winner_side) {
                results.push((Some(1), p));
            }
            if let Some(p) = final_match.player(winner_side.other()) {
                results.push((Some(2), p));
            }
        }
        for title in [SEMI_A_TITLE, SEMI_B_TITLE] {
            if let Some(id) = cat.matches.iter().copied().find(|id| {
                tournament.match_by_id(*id).map(|m| m.title == title).unwrap_or(false)
            }) {
                if let Ok(m) = tournament.match_by_id(id) {
                    if let Some(winner_side) = ruleset.winner(&m.state) {
                        if let Some(p) = m.player(winner_side.other()) {
                            results.push((Some(3), p));
                        }
                    }
                }
            }
        }
        results
    }

    fn is_finished(&self, tournament: &Tournament, category: CategoryId) -> bool {
        let Ok(cat) = tournament.category(category) else {
            return false;
        };
        let Some(final_id) = cat.matches.iter().copied().find(|id| {
            tournament.match_by_id(*id).map(|m| m.title == FINAL_TITLE).unwrap_or(false)
        }) else {
            return false;
        };
        tournament.match_by_id(final_id).map(|m| m.is_finished()).unwrap_or(false)
    }
}
