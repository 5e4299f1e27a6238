//! Agent and fiend protection semantics.

use super::test_utils::*;
use crate::game::action::NightAction;
use crate::game::player::FiendMode;
use crate::game::roles::{DeathCause, Faction, Role};
use crate::game::{NightInputs, Theme};
use std::collections::BTreeMap;

fn night(actions: BTreeMap<usize, NightAction>) -> NightInputs {
    NightInputs { human_actions: actions, include_human: false }
}

#[test]
fn agent_protection_blocks_killer_murder() {
    let mut game = create_scripted_game(51, Theme::CounterTerror);
    let agent = first_with_role(&game, Role::Agent);
    let ward = some_civilian(&game, &[]);

    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, ward);
    actions.insert(agent, NightAction::AgentProtect { target_id: ward });
    game.resolve_night(None, &night(actions));

    assert!(game.players[ward].alive);
    assert!(game.players[agent].alive);
}

#[test]
fn sniper_headshot_ignores_agent_protection() {
    let mut game = create_scripted_game(52, Theme::CounterTerror);
    let agent = first_with_role(&game, Role::Agent);
    let sniper = first_with_role(&game, Role::Sniper);
    let ward = some_civilian(&game, &[]);

    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, ward);
    actions.insert(agent, NightAction::AgentProtect { target_id: ward });
    actions.insert(sniper, NightAction::SniperShot { target_id: ward });
    game.resolve_night(None, &night(actions));

    assert!(!game.players[ward].alive);
    assert_eq!(game.players[ward].death_cause, Some(DeathCause::SniperHeadshot));
    assert_eq!(game.usage.sniper_shots, 1);
}

#[test]
fn fiend_absorbs_a_kill_and_charges_up() {
    let mut game = create_scripted_game(53, Theme::PsychicCentury);
    let fiend = first_with_role(&game, Role::HeavenlyFiend);
    let ward = some_civilian(&game, &[]);

    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, ward);
    actions.insert(fiend, NightAction::FiendProtect { target_id: ward });
    game.resolve_night(None, &night(actions));

    assert!(game.players[ward].alive);
    assert_eq!(game.players[fiend].status.fiend_mode, Some(FiendMode::Charge));

    // Charged, the fiend can fire; the shot flips it back to absorb.
    let victim = some_civilian(&game, &[ward]);
    let decoy = some_civilian(&game, &[ward, victim]);
    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, decoy);
    actions.insert(fiend, NightAction::FiendShoot { target_id: victim });
    game.resolve_night(None, &night(actions));

    assert!(!game.players[victim].alive);
    assert_eq!(game.players[victim].death_cause, Some(DeathCause::FiendShot));
    assert_eq!(game.players[fiend].status.fiend_mode, Some(FiendMode::Absorb));
}

#[test]
fn fiend_cannot_shoot_while_absorbing() {
    let mut game = create_scripted_game(54, Theme::PsychicCentury);
    let fiend = first_with_role(&game, Role::HeavenlyFiend);
    let victim = some_civilian(&game, &[]);
    let decoy = some_civilian(&game, &[victim]);

    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, decoy);
    actions.insert(fiend, NightAction::FiendShoot { target_id: victim });
    game.resolve_night(None, &night(actions));

    assert!(game.players[victim].alive);
}

#[test]
fn four_soul_curse_pierces_agent_protection() {
    let mut game = create_scripted_game(55, Theme::CounterTerror);
    let agent = first_with_role(&game, Role::Agent);
    let ward = some_civilian(&game, &[]);
    // No theme fields both an agent and a necromancer, so conjure one.
    let necromancer = some_civilian(&game, &[ward]);
    game.players[necromancer].role = Role::Necromancer;
    game.players[necromancer].faction = Faction::Red;
    game.players[necromancer].souls = 4;
    let decoy = some_civilian(&game, &[ward, necromancer]);

    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, decoy);
    actions.insert(agent, NightAction::AgentProtect { target_id: ward });
    actions.insert(necromancer, NightAction::NecromancerCurse { target_id: ward });
    game.resolve_night(None, &night(actions));

    assert!(!game.players[ward].alive);
    assert_eq!(game.players[ward].death_cause, Some(DeathCause::NecromancerCurse));
    // All four souls were spent; only the decoy's death accrues a new one.
    assert_eq!(game.players[necromancer].souls, 1);
}

#[test]
fn protection_flags_reset_each_night() {
    let mut game = create_scripted_game(56, Theme::CounterTerror);
    let agent = first_with_role(&game, Role::Agent);
    let ward = some_civilian(&game, &[]);
    let decoy = some_civilian(&game, &[ward]);

    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, decoy);
    actions.insert(agent, NightAction::AgentProtect { target_id: ward });
    game.resolve_night(None, &night(actions));
    assert!(game.players[ward].status.protected_by_agent);

    // Next night the killers reach the unprotected ward.
    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, ward);
    game.resolve_night(None, &night(actions));

    assert!(!game.players[ward].alive);
    assert_eq!(game.players[ward].death_cause, Some(DeathCause::KillerMurder));
}
