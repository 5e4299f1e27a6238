use super::roles::{Faction, Role};
use super::Game;
use serde::{Deserialize, Serialize};

/// The faction declared as winner. Identifiers are part of the wire protocol.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    Grudge,
    Zombie,
    Red,
    Blue,
}

/// The declared victory; once set, the game accepts no further mutation.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Victory {
    pub winner: Winner,
    pub reason: String,
}

/// A rough win-probability hint derived from living faction ratios.
/// Not a rules-accurate probability; clients display it as a mood gauge.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default)]
pub struct WinrateHint {
    pub red: f64,
    pub blue: f64,
    pub alive: usize,
}

/// Living-population tallies used by the victory evaluator.
///
/// `civilians` counts every living player who is neither police nor killer,
/// which is what the civilian-wipe win condition measures.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FactionCounts {
    pub blue: usize,
    pub red: usize,
    pub green: usize,
    pub killers: usize,
    pub police: usize,
    pub civilians: usize,
    pub zombies: usize,
    pub grudge: usize,
}

impl Game {
    pub(crate) fn faction_counts(&self) -> FactionCounts {
        let mut counts = FactionCounts::default();
        for p in self.players.iter().filter(|p| p.alive) {
            match p.faction {
                Faction::Blue => counts.blue += 1,
                Faction::Red => counts.red += 1,
                Faction::Green => counts.green += 1,
            }
            match p.role {
                Role::Killer => counts.killers += 1,
                Role::Police => counts.police += 1,
                Role::Zombie => counts.zombies += 1,
                Role::GrudgeBeast => counts.grudge += 1,
                _ => {}
            }
            if p.role != Role::Police && p.role != Role::Killer {
                counts.civilians += 1;
            }
        }
        counts
    }

    pub(crate) fn update_winrate_hint(&mut self) {
        let counts = self.faction_counts();
        let alive = self.alive_players().count().max(1);
        let contesting = (counts.red + counts.blue).max(1) as f64;
        self.winrate_hint = WinrateHint {
            red: (counts.red as f64 / contesting).clamp(0.0, 1.0),
            blue: (counts.blue as f64 / contesting).clamp(0.0, 1.0),
            alive,
        };
    }

    /// Evaluates the faction victory conditions in strict precedence order:
    /// Grudge Beasts, then Zombies, then Red, then Blue. Sets and returns
    /// the victory record when one fires.
    pub fn check_victory(&mut self) -> Option<Victory> {
        if let Some(victory) = &self.victory {
            return Some(victory.clone());
        }

        let counts = self.faction_counts();
        let alive_total = self.alive_players().count();
        let civilian_auto_win = self.theme.civilian_wipe_auto_win() && counts.civilians == 0;

        // 1) Grudge Beast precedence
        if counts.grudge > 0 {
            if self.grudge_berserk {
                if counts.killers == 0 || counts.police == 0 {
                    return self.declare(Winner::Grudge, "Grudge Beasts finished their rage condition.");
                }
            } else {
                return self.declare(Winner::Grudge, "Grudge Beasts survive without berserk.");
            }
        }

        // 2) Zombie majority
        if counts.zombies * 2 > alive_total {
            return self.declare(Winner::Zombie, "Zombies outnumber the living.");
        }

        // 3) Red elimination conditions
        let has_other_specials = self.players.iter().any(|p| {
            p.alive
                && !matches!(
                    p.role,
                    Role::Police | Role::Killer | Role::Civilian | Role::Zombie | Role::GrudgeBeast
                )
        });
        if (counts.killers >= counts.blue && !has_other_specials)
            || counts.police == 0
            || civilian_auto_win
        {
            return self.declare(Winner::Red, "Red faction satisfied elimination condition.");
        }

        // 4) Blue victory
        if counts.killers == 0 {
            return self.declare(Winner::Blue, "All killers eliminated.");
        }

        None
    }

    fn declare(&mut self, winner: Winner, reason: &str) -> Option<Victory> {
        let victory = Victory { winner, reason: reason.to_string() };
        self.victory = Some(victory.clone());
        Some(victory)
    }
}
