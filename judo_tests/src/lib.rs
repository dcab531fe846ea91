//! Shared fixture builders and generic correctness properties, used by
//! `judo_core`'s and `judo_net`'s own test suites rather than duplicated
//! in each. Mirrors squire's own workspace-level test-support crate
//! pattern of keeping fixtures in one place all the other crates'
//! `dev-dependencies` point at.

pub mod properties;

use chrono::Utc;
use judo_core::draw::DrawTag;
use judo_core::identifiers::{id_from_item, CategoryId, PlayerId};
use judo_core::operations::category_ops::{AddCategory, AddPlayersToCategory};
use judo_core::operations::player_ops::AddPlayer;
use judo_core::operations::Action;
use judo_core::player::PlayerFields;
use judo_core::ruleset::RulesetTag;
use judo_core::tournament::Tournament;

pub fn empty_tournament() -> Tournament {
    let salt = Utc::now();
    let id = id_from_item(salt, "fixture tournament");
    Tournament::new(id, "Fixture Tournament".to_string(), salt)
}

fn player_fields(first: &str, last: &str) -> PlayerFields {
    PlayerFields {
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..Default::default()
    }
}

/// A tournament with `names.len()` players added, in order, via
/// individual `AddPlayer` dispatches.
pub fn tournament_with_players(names: &[(&str, &str)]) -> (Tournament, Vec<PlayerId>) {
    let mut tournament = empty_tournament();
    let mut ids = Vec::with_capacity(names.len());
    for (first, last) in names {
        let fields = player_fields(first, last);
        let id = id_from_item(tournament.salt, format!("{first} {last}"));
        let mut action = AddPlayer::new(id, fields);
        action.apply(&mut tournament).expect("fixture AddPlayer cannot fail");
        ids.push(id);
    }
    (tournament, ids)
}

fn add_category(
    tournament: &mut Tournament,
    name: &str,
    draw_tag: DrawTag,
) -> CategoryId {
    let id = id_from_item(tournament.salt, name);
    let mut action = AddCategory::new(id, name.to_string(), RulesetTag::IJF_STANDARD, draw_tag);
    action.apply(tournament).expect("fixture AddCategory cannot fail");
    id
}

fn draw_with_players(
    tournament: &mut Tournament,
    category: CategoryId,
    players: Vec<PlayerId>,
    seed: u64,
) {
    let mut action = AddPlayersToCategory::new(category, players, seed);
    action
        .apply(tournament)
        .expect("fixture AddPlayersToCategory cannot fail");
}

/// A tournament with one pool-draw category holding 4 players, already
/// drawn into a round-robin schedule.
pub fn drawn_pool_category(seed: u64) -> (Tournament, CategoryId, Vec<PlayerId>) {
    let (mut tournament, players) = tournament_with_players(&[
        ("Shohei", "Ono"),
        ("Naohisa", "Takato"),
        ("An", "Baul"),
        ("Fabio", "Basile"),
    ]);
    let category = add_category(&mut tournament, "Men -73kg", DrawTag::POOL);
    draw_with_players(&mut tournament, category, players.clone(), seed);
    (tournament, category, players)
}

/// A tournament with one knockout category holding 5 players (forcing a
/// bye), already drawn into a bracket.
pub fn drawn_knockout_category(seed: u64) -> (Tournament, CategoryId, Vec<PlayerId>) {
    let (mut tournament, players) = tournament_with_players(&[
        ("Clarisse", "Agbegnenou"),
        ("Distria", "Krasniqi"),
        ("Tina", "Trstenjak"),
        ("Marica", "Perisic"),
        ("Alice", "Bellandi"),
    ]);
    let category = add_category(&mut tournament, "Women -63kg", DrawTag::KNOCKOUT);
    draw_with_players(&mut tournament, category, players.clone(), seed);
    (tournament, category, players)
}

/// A tournament with one double-pool category holding 8 players, already
/// drawn into two pools.
pub fn drawn_double_pool_category(seed: u64) -> (Tournament, CategoryId, Vec<PlayerId>) {
    let names = [
        ("Teddy", "Riner"),
        ("Kokoro", "Kageura"),
        ("Guram", "Tushishvili"),
        ("Jorge", "Fonseca"),
        ("Tamerlan", "Bashaev"),
        ("Varlam", "Liparteliani"),
        ("Alisher", "Yusupov"),
        ("Niyaz", "Ilyasov"),
    ];
    let (mut tournament, players) = tournament_with_players(&names);
    let category = add_category(&mut tournament, "Men +100kg", DrawTag::DOUBLE_POOL);
    draw_with_players(&mut tournament, category, players.clone(), seed);
    (tournament, category, players)
}
