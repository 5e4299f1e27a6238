use super::roles::{DeathCause, Faction, Role, MAX_EXORCIST_CHAINS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two modes of the Heavenly Fiend. Absorbing a kill flips the fiend
/// into charge mode for the following night.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FiendMode {
    Absorb,
    Charge,
}

/// Per-player transient and semi-transient status.
///
/// The nightly flags (smoke, kidnap, purify, protection, cannot-act, bites)
/// are cleared on entry to each night; the rest persist across rounds.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Status {
    pub smoked: u32,
    pub kidnapped: bool,
    pub purified: bool,
    pub protected_by_agent: bool,
    pub protected_by_fiend: bool,
    pub protection_source: Option<usize>,
    pub cannot_act: bool,
    pub arson_marked: bool,
    pub vine_seeded_by: Option<usize>,
    pub vine_active: bool,
    pub fiend_mode: Option<FiendMode>,
    pub brat_revealed: bool,
    pub brat_revived: bool,
    pub zombie_bites: u32,
    pub pending_zombie_conversion: bool,
}

impl Status {
    fn new(role: Role) -> Self {
        Self {
            smoked: 0,
            kidnapped: false,
            purified: false,
            protected_by_agent: false,
            protected_by_fiend: false,
            protection_source: None,
            cannot_act: false,
            arson_marked: false,
            vine_seeded_by: None,
            vine_active: role == Role::VineDemon,
            fiend_mode: (role == Role::HeavenlyFiend).then_some(FiendMode::Absorb),
            brat_revealed: false,
            brat_revived: false,
            zombie_bites: 0,
            pending_zombie_conversion: false,
        }
    }

    /// Clears the flags that only live for one night.
    pub fn reset_nightly(&mut self) {
        self.smoked = 0;
        self.kidnapped = false;
        self.purified = false;
        self.protected_by_agent = false;
        self.protected_by_fiend = false;
        self.protection_source = None;
        self.cannot_act = false;
        self.zombie_bites = 0;
    }
}

/// A game player.
///
/// Role and faction are immutable once assigned, except for forced zombie
/// conversion which overwrites both. The suspicion map is the player's AI
/// memory: a belief score in (0,1) per other player, keyed by id. A `BTreeMap`
/// keeps iteration deterministic.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Player {
    pub id: usize,
    pub name: String,
    pub role: Role,
    pub faction: Faction,
    pub alive: bool,
    pub is_human: bool,
    pub death_cause: Option<DeathCause>,
    pub last_words: String,
    pub status: Status,
    pub empty_injections: u32,
    pub souls: u32,
    pub chains_left: u32,
    pub last_kidnap_target: Option<usize>,
    pub suspicion: BTreeMap<usize, f64>,
}

impl Player {
    pub fn new(id: usize, name: String, role: Role) -> Self {
        Self {
            id,
            name,
            role,
            faction: role.faction(),
            alive: true,
            is_human: false,
            death_cause: None,
            last_words: String::new(),
            status: Status::new(role),
            empty_injections: 0,
            souls: 0,
            chains_left: if role == Role::Exorcist { MAX_EXORCIST_CHAINS } else { 0 },
            last_kidnap_target: None,
            suspicion: BTreeMap::new(),
        }
    }

    /// Forced conversion by zombie infection: the one case where role and
    /// faction are overwritten.
    pub fn turn_zombie(&mut self) {
        self.role = Role::Zombie;
        self.faction = Faction::Green;
    }
}
