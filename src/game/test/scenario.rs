//! The standard 18-seat opening-round scenario.

use super::test_utils::*;
use crate::game::roles::{Faction, Phase};
use crate::game::{NightInputs, Theme, VoteInputs};

#[test]
fn first_night_and_empty_vote_round() {
    // 18-seat Good-vs-Evil, every seat human, no submitted inputs at all.
    let mut game = create_scripted_game(91, Theme::GoodVsEvil);

    // Night 1 with no human action resolves to DAY with the day counter
    // still at 1. With nobody acting, the only possible death is the
    // killers' random fallback pick, which never takes a red player.
    game.resolve_night(None, &NightInputs::default());
    assert_eq!(game.phase(), Phase::Day);
    assert_eq!(game.day_number(), 1);
    assert!(game.dead_ids.len() <= 1);
    for &id in &game.dead_ids {
        assert_ne!(game.players[id].faction, Faction::Red);
    }
    assert!(game.victory().is_none());

    // Vote 1 with an empty vote set executes nobody, logs the stalemate,
    // and advances to night 2.
    let deaths_before = game.dead_ids.len();
    game.begin_vote();
    assert_eq!(game.phase(), Phase::Vote);
    game.resolve_vote(None, "", &VoteInputs::default());

    assert_eq!(game.dead_ids.len(), deaths_before);
    assert_eq!(game.phase(), Phase::Night);
    assert_eq!(game.day_number(), 2);
    assert!(game
        .public_log
        .iter()
        .any(|l| l == "No majority reached. Nobody was executed."));
}

#[test]
fn terminal_state_accepts_no_further_resolutions() {
    let mut game = create_scripted_game(92, Theme::FinalJudgement);
    // Any living non-berserk grudge beast ends the game at the first check.
    // The killers aim at a civilian so no beast can die and avert it.
    let decoy = some_civilian(&game, &[]);
    let mut actions = std::collections::BTreeMap::new();
    script_killer_votes(&game, &mut actions, decoy);
    game.resolve_night(
        None,
        &NightInputs { human_actions: actions, include_human: false },
    );
    assert_eq!(game.phase(), Phase::End);
    assert!(game.victory().is_some());

    let log_len = game.public_log.len();
    let day = game.day_number();
    game.resolve_night(None, &NightInputs::default());
    game.resolve_vote(None, "", &VoteInputs::default());
    game.begin_vote();

    assert_eq!(game.public_log.len(), log_len);
    assert_eq!(game.day_number(), day);
    assert_eq!(game.phase(), Phase::End);
}
