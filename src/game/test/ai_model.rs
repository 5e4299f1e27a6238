//! Suspicion model and AI decision invariants.

use super::test_utils::*;
use crate::game::roles::Role;
use crate::game::{NightInputs, Theme, VoteInputs};

#[test]
fn suspicion_scores_stay_in_open_unit_interval() {
    let mut game = create_test_game(81, Theme::GoodVsEvil);
    for _ in 0..4 {
        game.resolve_night(None, &NightInputs { include_human: true, ..Default::default() });
        if game.game_over() {
            break;
        }
        game.resolve_vote(None, "", &VoteInputs { include_human: true, ..Default::default() });
        if game.game_over() {
            break;
        }
    }
    for p in &game.players {
        for (&target, &score) in &p.suspicion {
            assert!(score > 0.0 && score < 1.0, "suspicion {} for target {}", score, target);
        }
    }
}

#[test]
fn ai_vote_tally_is_never_empty_while_ai_is_alive() {
    // The last AI voter is never allowed to abstain.
    for seed in [1u64, 2, 3, 4, 5] {
        let mut game = create_test_game(seed, Theme::GoodVsEvil);
        let votes = game.build_ai_votes(None, false);
        assert!(!votes.is_empty(), "seed {}", seed);
        for (actor, target) in votes {
            assert!(game.players[actor].alive);
            assert!(game.players[target].alive);
            assert_ne!(actor, target);
        }
    }
}

#[test]
fn revived_brats_lose_their_vote() {
    let mut game = create_test_game(82, Theme::PsychicCentury);
    let brat = first_with_role(&game, Role::Brat);
    game.players[brat].status.brat_revived = true;
    let votes = game.build_ai_votes(None, true);
    assert!(votes.iter().all(|&(actor, _)| actor != brat));
}

#[test]
fn ai_generates_at_most_one_action_per_actor() {
    let mut game = create_test_game(83, Theme::DoomsdayHorror);
    let actions = game.build_ai_night_actions(None, &NightInputs::default());
    let mut actors: Vec<usize> = actions.iter().map(|a| a.actor_id).collect();
    actors.sort_unstable();
    actors.dedup();
    assert_eq!(actors.len(), actions.len());
    for a in &actions {
        assert!(game.players[a.actor_id].alive);
        assert!(!game.players[a.actor_id].is_human);
    }
}

#[test]
fn roles_without_night_actions_stay_idle() {
    let mut game = create_test_game(84, Theme::PsychicCentury);
    let actions = game.build_ai_night_actions(None, &NightInputs::default());
    for a in &actions {
        let role = game.players[a.actor_id].role;
        assert!(role.has_night_action(), "{:?} submitted an action", role);
    }
}

#[test]
fn chat_generates_at_most_six_speaker_lines() {
    let mut game = create_test_game(85, Theme::GoodVsEvil);
    let lines = game.generate_chat_lines();
    assert!(lines.len() <= 6);
    for line in &lines {
        let speaker = line.split(':').next().unwrap();
        assert!(
            game.players.iter().any(|p| p.name == speaker && p.alive && !p.is_human),
            "bad speaker in {:?}",
            line
        );
    }
}

#[test]
fn night_resolution_emits_day_chat() {
    let mut game = create_test_game(86, Theme::GoodVsEvil);
    game.resolve_night(None, &NightInputs::default());
    assert!(!game.day_chat.is_empty());
    let last = game.day_chat.last().unwrap().clone();
    assert!(game.public_log.iter().any(|l| l == &last));
}
