//! Generic correctness checks runnable against any tournament state,
//! independent of which action produced it.

use judo_core::tournament::Tournament;

/// `c ∈ p.categories ⇔ p.id ∈ tournament.categories[c].players` for every
/// player and category.
pub fn cross_index_consistent(tournament: &Tournament) -> Result<(), String> {
    for (player_id, player) in &tournament.players {
        for category_id in &player.categories {
            let category = tournament
                .categories
                .get(category_id)
                .ok_or_else(|| format!("player {player_id} claims unknown category {category_id}"))?;
            if !category.players.contains(player_id) {
                return Err(format!(
                    "player {player_id} claims category {category_id} but category does not list it back"
                ));
            }
        }
    }
    for (category_id, category) in &tournament.categories {
        for player_id in &category.players {
            let player = tournament
                .players
                .get(player_id)
                .ok_or_else(|| format!("category {category_id} claims unknown player {player_id}"))?;
            if !player.categories.contains(category_id) {
                return Err(format!(
                    "category {category_id} claims player {player_id} but player does not list it back"
                ));
            }
        }
    }
    Ok(())
}

/// Each category's cached `TypeCounts` agrees with a fresh tally over its
/// actual match statuses.
pub fn counts_consistent(tournament: &Tournament) -> Result<(), String> {
    for (category_id, category) in &tournament.categories {
        let mut tallied: std::collections::HashMap<judo_core::matches::MatchType, judo_core::category::TypeCounts> =
            std::collections::HashMap::new();
        for match_id in &category.matches {
            let m = tournament
                .matches
                .get(match_id)
                .ok_or_else(|| format!("category {category_id} references unknown match {match_id}"))?;
            let entry = tallied.entry(m.match_type).or_default();
            match m.state.status {
                judo_core::matches::MatchStatus::NotStarted => entry.not_started += 1,
                judo_core::matches::MatchStatus::Finished => entry.finished += 1,
                _ => entry.started += 1,
            }
        }
        for (match_type, expected) in &tallied {
            let actual = category.counts_for(*match_type);
            if actual != *expected {
                return Err(format!(
                    "category {category_id} counts for {match_type:?} are {actual:?}, tallied {expected:?}"
                ));
            }
        }
    }
    Ok(())
}

/// Applying an action then undoing it must restore the tournament to a
/// byte-identical encoding of its prior state (the inverse law every
/// action implementation must satisfy).
pub fn inverse_law_holds(
    tournament: &mut Tournament,
    action: &mut dyn judo_core::operations::Action,
) -> Result<(), String> {
    let before = judo_core::persistence::encode(tournament).map_err(|e| e.to_string())?;
    action.apply(tournament).map_err(|e| e.to_string())?;
    action.undo(tournament);
    let after = judo_core::persistence::encode(tournament).map_err(|e| e.to_string())?;
    if before != after {
        return Err("tournament state after apply+undo differs from before apply".to_string());
    }
    Ok(())
}

/// Undoing an action twice in a row must be safe: the second undo is a
/// no-op rather than a panic or a double-reversal.
pub fn undo_is_idempotent(
    tournament: &mut Tournament,
    action: &mut dyn judo_core::operations::Action,
) -> Result<(), String> {
    action.apply(tournament).map_err(|e| e.to_string())?;
    action.undo(tournament);
    let once = judo_core::persistence::encode(tournament).map_err(|e| e.to_string())?;
    action.undo(tournament);
    let twice = judo_core::persistence::encode(tournament).map_err(|e| e.to_string())?;
    if once != twice {
        return Err("second undo changed state beyond the first undo".to_string());
    }
    Ok(())
}
