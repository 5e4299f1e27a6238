//! Day-vote tally, execution, history and brat revival tests.

use super::test_utils::*;
use crate::game::roles::{DeathCause, Phase, Role};
use crate::game::{Theme, VoteInputs};
use std::collections::BTreeMap;

fn votes(entries: &[(usize, usize)]) -> VoteInputs {
    VoteInputs {
        human_votes: entries.iter().copied().collect(),
        last_words_by_player: BTreeMap::new(),
        include_human: false,
    }
}

#[test]
fn majority_vote_executes_the_target() {
    let mut game = create_scripted_game(61, Theme::GoodVsEvil);
    let victim = some_civilian(&game, &[]);
    let voters: Vec<usize> = (0..18).filter(|&id| id != victim).take(10).collect();
    let entries: Vec<(usize, usize)> = voters.iter().map(|&v| (v, victim)).collect();

    game.resolve_vote(None, "", &votes(&entries));

    assert!(!game.players[victim].alive);
    assert_eq!(game.players[victim].death_cause, Some(DeathCause::VoteExecution));
    assert!(game
        .public_log
        .iter()
        .any(|l| l.contains("was executed by vote (10/18).")));
    assert_eq!(game.phase(), Phase::Night);
    assert_eq!(game.day_number(), 2);
}

#[test]
fn plurality_fallback_breaks_ties_toward_lower_id() {
    let mut game = create_scripted_game(62, Theme::GoodVsEvil);
    let a = some_civilian(&game, &[]);
    let b = some_civilian(&game, &[a]);
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    let voters: Vec<usize> = (0..18).filter(|&id| id != low && id != high).take(4).collect();
    let entries = vec![
        (voters[0], low),
        (voters[1], low),
        (voters[2], high),
        (voters[3], high),
    ];

    game.resolve_vote(None, "", &votes(&entries));

    assert!(!game.players[low].alive);
    assert!(game.players[high].alive);
    assert!(game
        .public_log
        .iter()
        .any(|l| l.contains("was executed by highest votes (2).")));
}

#[test]
fn empty_vote_executes_nobody() {
    let mut game = create_scripted_game(63, Theme::GoodVsEvil);

    game.resolve_vote(None, "", &votes(&[]));

    assert!(game.players.iter().all(|p| p.alive));
    assert!(game
        .public_log
        .iter()
        .any(|l| l == "No majority reached. Nobody was executed."));
    assert_eq!(game.phase(), Phase::Night);
    assert_eq!(game.day_number(), 2);
}

#[test]
fn vote_history_records_order_tally_and_flips() {
    let mut game = create_scripted_game(64, Theme::GoodVsEvil);
    let a = some_civilian(&game, &[]);
    let b = some_civilian(&game, &[a]);
    let voter = (0..18).find(|&id| id != a && id != b).unwrap();

    game.resolve_vote(None, "", &votes(&[(voter, a)]));
    assert_eq!(game.vote_history.len(), 1);
    assert_eq!(game.vote_history[0].day, 1);
    assert!(game.vote_history[0].flips.is_empty());
    assert_eq!(game.vote_history[0].tally.get(&a), Some(&1));

    // Voting differently the next day marks the actor as a flip-flopper.
    game.resolve_vote(None, "", &votes(&[(voter, b)]));
    assert_eq!(game.vote_history.len(), 2);
    assert_eq!(game.vote_history[1].flips, vec![voter]);
}

#[test]
fn executed_human_records_truncated_last_words() {
    let mut game = create_scripted_game(65, Theme::GoodVsEvil);
    let victim = some_civilian(&game, &[]);
    let voters: Vec<usize> = (0..18).filter(|&id| id != victim).take(10).collect();
    let entries: Vec<(usize, usize)> = voters.iter().map(|&v| (v, victim)).collect();
    let mut inputs = votes(&entries);
    let long_words = "x".repeat(80);
    inputs.last_words_by_player.insert(victim, long_words);

    game.resolve_vote(None, "", &inputs);

    assert!(!game.players[victim].alive);
    assert_eq!(game.players[victim].last_words.chars().count(), 64);
    assert!(game.public_log.iter().any(|l| l.starts_with("Last words:")));
}

#[test]
fn brat_revives_once_then_dies_for_good() {
    let mut game = create_scripted_game(66, Theme::PsychicCentury);
    let brat = first_with_role(&game, Role::Brat);
    let voters: Vec<usize> = (0..18).filter(|&id| id != brat).take(10).collect();
    let entries: Vec<(usize, usize)> = voters.iter().map(|&v| (v, brat)).collect();

    game.resolve_vote(None, "", &votes(&entries));

    assert!(game.players[brat].alive, "first execution revives the brat");
    assert!(game.players[brat].status.brat_revived);
    assert!(game.players[brat].status.brat_revealed);
    assert!(game.alive_ids.contains(&brat));
    assert!(!game.dead_ids.contains(&brat));
    assert!(game
        .public_log
        .iter()
        .any(|l| l.contains("revealed as Brat and revived")));

    game.resolve_vote(None, "", &votes(&entries));

    assert!(!game.players[brat].alive, "the revival is strictly one-time");
    assert_eq!(game.players[brat].death_cause, Some(DeathCause::VoteExecution));
}

#[test]
fn brat_killed_at_night_does_not_revive() {
    let mut game = create_scripted_game(67, Theme::PsychicCentury);
    let brat = first_with_role(&game, Role::Brat);
    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, brat);

    game.resolve_night(
        None,
        &crate::game::NightInputs { human_actions: actions, include_human: false },
    );

    assert!(!game.players[brat].alive);
    assert_eq!(game.players[brat].death_cause, Some(DeathCause::KillerMurder));
    assert!(!game.players[brat].status.brat_revived);
}

#[test]
fn dead_players_votes_are_still_tallied_only_for_valid_targets() {
    // A vote aimed at a dead player resolves to nobody when the target is
    // already dead at execution time.
    let mut game = create_scripted_game(68, Theme::GoodVsEvil);
    let victim = some_civilian(&game, &[]);
    game.mark_death(victim, DeathCause::KillerMurder);

    let voters: Vec<usize> = (0..18).filter(|&id| id != victim).take(10).collect();
    let entries: Vec<(usize, usize)> = voters.iter().map(|&v| (v, victim)).collect();
    game.resolve_vote(None, "", &votes(&entries));

    // Nobody newly died; the game moved on.
    assert_eq!(game.dead_ids.len(), 1);
    assert_eq!(game.phase(), Phase::Night);
    assert_eq!(game.day_number(), 2);
}
