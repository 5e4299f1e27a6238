//! Shared fixtures and helpers for engine tests.

use crate::game::action::NightAction;
use crate::game::roles::Role;
use crate::game::{Difficulty, Game, SeatAssignment, Theme, MAX_PLAYERS};
use std::collections::BTreeMap;

/// A standard game with one random human seat and 17 AI players.
pub fn create_test_game(seed: u64, theme: Theme) -> Game {
    Game::new(seed, theme, Difficulty::Normal, &[])
}

/// A game where every seat is claimed by a human, so the AI generates no
/// actions and tests can script every input exactly.
pub fn create_scripted_game(seed: u64, theme: Theme) -> Game {
    let seats: Vec<SeatAssignment> = (0..MAX_PLAYERS)
        .map(|i| SeatAssignment { seat: i, name: format!("Player {}", i + 1) })
        .collect();
    Game::new(seed, theme, Difficulty::Normal, &seats)
}

pub fn ids_with_role(game: &Game, role: Role) -> Vec<usize> {
    game.players
        .iter()
        .filter(|p| p.role == role)
        .map(|p| p.id)
        .collect()
}

pub fn first_with_role(game: &Game, role: Role) -> usize {
    ids_with_role(game, role)[0]
}

/// Scripts every living killer to vote for the same target, keeping the
/// night deterministic for whatever mechanic the test actually exercises.
pub fn script_killer_votes(
    game: &Game,
    actions: &mut BTreeMap<usize, NightAction>,
    target_id: usize,
) {
    for id in ids_with_role(game, Role::Killer) {
        if game.players[id].alive {
            actions.insert(id, NightAction::KillerVote { target_id });
        }
    }
}

/// A living civilian other than any of the given ids, for use as a bystander
/// or killer victim.
pub fn some_civilian(game: &Game, exclude: &[usize]) -> usize {
    game.players
        .iter()
        .filter(|p| p.alive && p.role == Role::Civilian && !exclude.contains(&p.id))
        .map(|p| p.id)
        .next()
        .expect("no civilian available")
}
