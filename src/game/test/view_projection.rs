//! Player-view projection and visibility filtering.

use super::test_utils::*;
use crate::game::action::NightAction;
use crate::game::roles::{DeathCause, Role};
use crate::game::{NightInputs, Theme};
use std::collections::BTreeMap;

#[test]
fn own_role_is_always_visible() {
    let game = create_scripted_game(101, Theme::GoodVsEvil);
    for p in &game.players {
        let view = game.build_player_view(p.id).unwrap();
        assert_eq!(view.you.role, p.role);
        let own = view.players.iter().find(|s| s.id == p.id).unwrap();
        assert!(own.is_you);
        assert_eq!(own.role, p.role.as_str());
    }
}

#[test]
fn living_strangers_are_hidden() {
    let game = create_scripted_game(102, Theme::GoodVsEvil);
    let civilian = some_civilian(&game, &[]);
    let killer = first_with_role(&game, Role::Killer);
    let view = game.build_player_view(civilian).unwrap();
    let seen = view.players.iter().find(|s| s.id == killer).unwrap();
    assert_eq!(seen.role, "HIDDEN");
    assert_eq!(seen.faction, "UNKNOWN");
}

#[test]
fn police_and_killers_recognize_their_peers() {
    let game = create_scripted_game(103, Theme::GoodVsEvil);
    let police = ids_with_role(&game, Role::Police);
    let killers = ids_with_role(&game, Role::Killer);

    let police_view = game.build_player_view(police[0]).unwrap();
    for &peer in &police[1..] {
        let seen = police_view.players.iter().find(|s| s.id == peer).unwrap();
        assert_eq!(seen.role, "POLICE");
        assert_eq!(seen.faction, "BLUE");
    }
    let seen_killer = police_view.players.iter().find(|s| s.id == killers[0]).unwrap();
    assert_eq!(seen_killer.role, "HIDDEN");

    let killer_view = game.build_player_view(killers[0]).unwrap();
    for &peer in &killers[1..] {
        let seen = killer_view.players.iter().find(|s| s.id == peer).unwrap();
        assert_eq!(seen.role, "KILLER");
        assert_eq!(seen.faction, "RED");
    }
}

#[test]
fn death_reveals_role_and_faction_to_everyone() {
    let mut game = create_scripted_game(104, Theme::GoodVsEvil);
    let killer = first_with_role(&game, Role::Killer);
    game.mark_death(killer, DeathCause::VoteExecution);

    let civilian = some_civilian(&game, &[]);
    let view = game.build_player_view(civilian).unwrap();
    let seen = view.players.iter().find(|s| s.id == killer).unwrap();
    assert!(!seen.alive);
    assert_eq!(seen.role, "KILLER");
    assert_eq!(seen.faction, "RED");
}

#[test]
fn private_intel_is_routed_by_role() {
    let mut game = create_scripted_game(105, Theme::GoodVsEvil);
    let police = ids_with_role(&game, Role::Police);
    let target = some_civilian(&game, &[]);
    let decoy = some_civilian(&game, &[target]);
    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, decoy);
    for &cop in &police {
        actions.insert(cop, NightAction::PoliceInvestigate { target_id: target });
    }
    game.resolve_night(None, &NightInputs { human_actions: actions, include_human: false });

    let police_view = game.build_player_view(police[0]).unwrap();
    assert!(police_view
        .private_intel
        .iter()
        .any(|l| l.starts_with("Investigation result:")));

    let killer = first_with_role(&game, Role::Killer);
    let killer_view = game.build_player_view(killer).unwrap();
    assert!(killer_view.private_intel.iter().any(|l| l.starts_with("Killers targeted")));

    let civilian_view = game.build_player_view(target).unwrap();
    assert!(civilian_view.private_intel.is_empty());
}

#[test]
fn views_carry_usage_counters_and_winrate_hint() {
    let mut game = create_scripted_game(106, Theme::GoodVsEvil);
    let sniper = first_with_role(&game, Role::Sniper);
    let victim = some_civilian(&game, &[]);
    let decoy = some_civilian(&game, &[victim]);
    let mut actions = BTreeMap::new();
    script_killer_votes(&game, &mut actions, decoy);
    actions.insert(sniper, NightAction::SniperShot { target_id: victim });
    game.resolve_night(None, &NightInputs { human_actions: actions, include_human: false });

    let view = game.build_player_view(0).unwrap();
    assert_eq!(view.usage.sniper_shots, 1);
    assert!(view.winrate_hint.alive >= 16);
    assert!(view.winrate_hint.red > 0.0 && view.winrate_hint.red < 1.0);
}

#[test]
fn view_serializes_with_protocol_identifiers() {
    let game = create_scripted_game(107, Theme::GoodVsEvil);
    let view = game.build_player_view(0).unwrap();
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["phase"], "NIGHT");
    assert_eq!(json["theme"], "GOOD_VS_EVIL");
    assert_eq!(json["dayNumber"], 1);
    assert!(json["players"][0]["name"].is_string());
    assert!(json["usage"]["doctorInjections"].is_number());
    assert!(json["winrateHint"]["alive"].is_number());
    let role = json["you"]["role"].as_str().unwrap();
    assert!(
        ["POLICE", "KILLER", "DOCTOR", "SNIPER", "CIVILIAN"].contains(&role),
        "unexpected role id {}",
        role
    );
}

#[test]
fn unknown_viewer_gets_no_view() {
    let game = create_scripted_game(108, Theme::GoodVsEvil);
    assert!(game.build_player_view(99).is_none());
}
