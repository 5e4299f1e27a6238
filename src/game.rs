use self::player::Player;
use self::rng::GameRng;
use self::victory::WinrateHint;
use self::votes::VoteRound;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod action;
mod ai;
mod night;
mod player;
mod rng;
mod roles;
mod test;
mod theme;
mod victory;
mod view;
mod votes;

pub use self::action::{NightAction, NightInputs, VoteInputs};
pub use self::roles::{DeathCause, Difficulty, Faction, Phase, Role};
pub use self::theme::Theme;
pub use self::victory::Victory;
pub use self::view::PlayerView;

pub const MAX_PLAYERS: usize = 18;

/// A lobby seat claimed by a connected human player.
#[derive(Clone, Debug)]
pub struct SeatAssignment {
    pub seat: usize,
    pub name: String,
}

/// A game of Midnight: eighteen seats, three factions, and a night/day/vote
/// loop that runs until one faction's victory condition is met.
///
/// The engine is synchronous and single-threaded. A resolution call fully
/// processes a phase transition before returning, and the caller must not
/// invoke it re-entrantly. Malformed or out-of-turn input is silently
/// ignored: the engine always produces a valid next state.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Game {
    seed: u64,
    rng: GameRng,
    phase: Phase,
    day_number: u32,
    theme: Theme,
    difficulty: Difficulty,
    players: Vec<Player>,
    alive_ids: Vec<usize>,
    dead_ids: Vec<usize>,
    public_log: Vec<String>,
    intel: IntelLogs,
    day_chat: Vec<String>,
    vote_history: Vec<VoteRound>,
    last_vote_target_by_actor: BTreeMap<usize, usize>,
    usage: ResourceUsage,
    grudge_berserk: bool,
    revealed_red: Option<usize>,
    victory: Option<Victory>,
    last_night_summary: Vec<String>,
    winrate_hint: WinrateHint,
}

/// Private logs, visible only to holders of the matching role.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
struct IntelLogs {
    police: Vec<String>,
    killer: Vec<String>,
    grudge: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum IntelChannel {
    Police,
    Killer,
    Grudge,
}

/// Game-wide consumption of limited role resources.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub doctor_injections: u32,
    pub sniper_shots: u32,
    pub riot_grenades: u32,
}

impl Game {
    /// Creates a new game: shuffles the theme's role pool onto the seats,
    /// marks one random seat as the default human, then applies the explicit
    /// seat assignments on top.
    pub fn new(seed: u64, theme: Theme, difficulty: Difficulty, seats: &[SeatAssignment]) -> Self {
        let mut rng = GameRng::seeded(seed);
        let mut pool = theme.role_pool();
        rng.shuffle(&mut pool);

        let human_seat = rng.index(pool.len());
        let mut players: Vec<Player> = pool
            .iter()
            .enumerate()
            .map(|(id, &role)| Player::new(id, format!("Player {}", id + 1), role))
            .collect();
        players[human_seat].is_human = true;
        for seat in seats {
            if let Some(player) = players.get_mut(seat.seat) {
                player.name = seat.name.clone();
                player.is_human = true;
            }
        }

        let alive_ids = (0..players.len()).collect();
        let mut game = Game {
            seed,
            rng,
            phase: Phase::Night,
            day_number: 1,
            theme,
            difficulty,
            players,
            alive_ids,
            dead_ids: vec![],
            public_log: vec![],
            intel: IntelLogs::default(),
            day_chat: vec![],
            vote_history: vec![],
            last_vote_target_by_actor: BTreeMap::new(),
            usage: ResourceUsage::default(),
            grudge_berserk: false,
            revealed_red: None,
            victory: None,
            last_night_summary: vec![],
            winrate_hint: WinrateHint::default(),
        };
        game.update_winrate_hint();
        game
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn day_number(&self) -> u32 {
        self.day_number
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn victory(&self) -> Option<&Victory> {
        self.victory.as_ref()
    }

    /// Returns true once a victory record is set; no further mutation is
    /// accepted after that.
    pub fn game_over(&self) -> bool {
        self.victory.is_some() || self.phase == Phase::End
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn public_log(&self) -> &[String] {
        &self.public_log
    }

    /// The explicit DAY → VOTE trigger. No game-rule computation happens
    /// here; it only opens the vote controls.
    pub fn begin_vote(&mut self) {
        if self.phase == Phase::Day && self.victory.is_none() {
            self.phase = Phase::Vote;
        }
    }

    /// Appends a day-discussion chat line on behalf of a player. The line
    /// feeds the AI's mention counting for the next vote.
    pub fn push_chat_line(&mut self, player_id: usize, text: &str) {
        if self.phase != Phase::Day || self.victory.is_some() {
            return;
        }
        let Some(player) = self.players.get(player_id) else {
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let text: String = text.chars().take(120).collect();
        let line = format!("{}: {}", player.name, text);
        self.day_chat.push(line.clone());
        self.public_log.push(line);
    }

    pub(crate) fn player(&self, id: usize) -> Option<&Player> {
        self.players.get(id)
    }

    pub(crate) fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    pub(crate) fn num_alive(&self) -> usize {
        self.alive_ids.len()
    }

    /// The default human seat, used when an input does not name its actor.
    pub(crate) fn human(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_human)
    }

    /// Appends to the public log and the running last-night summary.
    pub(crate) fn log_public(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.public_log.push(line.clone());
        self.last_night_summary.push(line);
    }

    pub(crate) fn log_intel(&mut self, channel: IntelChannel, line: impl Into<String>) {
        let log = match channel {
            IntelChannel::Police => &mut self.intel.police,
            IntelChannel::Killer => &mut self.intel.killer,
            IntelChannel::Grudge => &mut self.intel.grudge,
        };
        log.push(line.into());
    }

    /// Marks a player dead and keeps the alive/dead partition and the
    /// revealed-red marker consistent. Already-dead targets are ignored.
    pub(crate) fn mark_death(&mut self, player_id: usize, cause: DeathCause) {
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };
        if !player.alive {
            return;
        }
        player.alive = false;
        player.death_cause = Some(cause);
        let name = player.name.clone();
        self.alive_ids = self.players.iter().filter(|p| p.alive).map(|p| p.id).collect();
        if !self.dead_ids.contains(&player_id) {
            self.dead_ids.push(player_id);
        }
        if self.revealed_red == Some(player_id) {
            self.revealed_red = None;
        }
        self.log_public(format!("{} died ({}).", name, cause.description()));
    }

    /// Restores an executed Brat to life, the single exception to death
    /// being permanent.
    pub(crate) fn revive(&mut self, player_id: usize) {
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };
        player.alive = true;
        player.death_cause = None;
        self.alive_ids = self.players.iter().filter(|p| p.alive).map(|p| p.id).collect();
        self.dead_ids.retain(|&id| id != player_id);
    }
}
