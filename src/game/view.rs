use super::player::Player;
use super::roles::{Faction, Phase, Role};
use super::theme::Theme;
use super::victory::{Victory, WinrateHint};
use super::{Game, ResourceUsage};
use serde::Serialize;

/// What one player's seat shows to a given viewer. Hidden roles render as
/// the `HIDDEN`/`UNKNOWN` placeholders the client expects.
#[derive(Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: usize,
    pub name: String,
    pub alive: bool,
    pub role: String,
    pub faction: String,
    pub is_you: bool,
    pub brat_revealed: bool,
}

/// The viewer's own, fully visible identity.
#[derive(Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ViewerIdentity {
    pub id: usize,
    pub name: String,
    pub role: Role,
    pub faction: Faction,
    pub alive: bool,
}

/// A visibility-filtered projection of the game for one viewer.
///
/// A role or faction is revealed only to its owner, to same-role peers among
/// police and killers, or once the player is dead.
#[derive(Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub phase: Phase,
    pub day_number: u32,
    pub theme: Theme,
    pub victory: Option<Victory>,
    pub you: ViewerIdentity,
    pub players: Vec<PlayerSummary>,
    pub public_log: Vec<String>,
    pub last_night_summary: Vec<String>,
    pub private_intel: Vec<String>,
    pub winrate_hint: WinrateHint,
    pub usage: ResourceUsage,
}

fn can_see_role(viewer: &Player, target: &Player) -> bool {
    if !target.alive {
        return true;
    }
    if viewer.id == target.id {
        return true;
    }
    if viewer.role == Role::Police && target.role == Role::Police {
        return true;
    }
    if viewer.role == Role::Killer && target.role == Role::Killer {
        return true;
    }
    false
}

fn visible_role(viewer: &Player, target: &Player) -> String {
    if can_see_role(viewer, target) {
        target.role.as_str().to_string()
    } else {
        "HIDDEN".to_string()
    }
}

fn visible_faction(viewer: &Player, target: &Player) -> String {
    if can_see_role(viewer, target) {
        target.faction.as_str().to_string()
    } else {
        "UNKNOWN".to_string()
    }
}

impl Game {
    /// Projects the game into what the given player is permitted to see.
    pub fn build_player_view(&self, player_id: usize) -> Option<PlayerView> {
        let viewer = self.player(player_id)?;

        let players = self
            .players
            .iter()
            .map(|p| PlayerSummary {
                id: p.id,
                name: p.name.clone(),
                alive: p.alive,
                role: visible_role(viewer, p),
                faction: visible_faction(viewer, p),
                is_you: p.id == player_id,
                brat_revealed: p.status.brat_revealed,
            })
            .collect();

        let mut private_intel: Vec<String> = vec![];
        if viewer.role == Role::Police {
            private_intel.extend(self.intel.police.iter().cloned());
        }
        if viewer.role == Role::Killer {
            private_intel.extend(self.intel.killer.iter().cloned());
        }
        if viewer.role == Role::GrudgeBeast {
            private_intel.extend(self.intel.grudge.iter().cloned());
        }

        Some(PlayerView {
            phase: self.phase,
            day_number: self.day_number,
            theme: self.theme,
            victory: self.victory.clone(),
            you: ViewerIdentity {
                id: viewer.id,
                name: viewer.name.clone(),
                role: viewer.role,
                faction: viewer.faction,
                alive: viewer.alive,
            },
            players,
            public_log: self.public_log.clone(),
            last_night_summary: self.last_night_summary.clone(),
            private_intel,
            winrate_hint: self.winrate_hint,
            usage: self.usage,
        })
    }
}
