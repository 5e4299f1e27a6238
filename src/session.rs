use crate::error::GameError;
use crate::game::{
    Difficulty, Game, NightAction, NightInputs, Phase, SeatAssignment, Theme, VoteInputs,
    MAX_PLAYERS,
};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::Rng;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Advisory phase durations. Timers only decide *when* a resolution fires;
/// they carry no game logic themselves.
const NIGHT_DURATION: Duration = Duration::from_secs(30);
const DAY_DURATION: Duration = Duration::from_secs(20);
const VOTE_DURATION: Duration = Duration::from_secs(20);

/// Manages all the rooms running on the server.
#[derive(Default)]
pub struct RoomManager {
    rooms: DashMap<String, RoomHandle>,
}

pub type RoomHandle = Arc<Mutex<Room>>;

/// A single game room: the lobby seats, the running game, and the buffered
/// inputs of connected humans.
///
/// The room is the single writer of its game. Buffers hold one slot per
/// actor, last write wins, and are discarded on resolution, disconnect or
/// restart.
pub struct Room {
    id: String,
    state: RoomState,
    night_actions: BTreeMap<usize, NightAction>,
    vote_actions: BTreeMap<usize, usize>,
    last_words: BTreeMap<usize, String>,
    /// Channels for sending view updates to players, indexed by seat.
    player_states: Vec<watch::Sender<Value>>,
    host: Option<usize>,
    /// Bumped on every phase change so stale timer wakeups are discarded.
    timer_gen: u64,
}

enum RoomState {
    Lobby { seats: Vec<Seat> },
    Playing { game: Game, seats: Vec<Seat> },
}

#[derive(Clone, Debug)]
pub struct Seat {
    pub player_id: usize,
    pub name: String,
}

impl RoomManager {
    pub fn create_room(&self) -> (String, RoomHandle) {
        loop {
            let id = Self::random_id();
            let entry = self.rooms.entry(id);
            if let Entry::Occupied(_) = entry {
                continue;
            }
            let room = Arc::new(Mutex::new(Room::new(entry.key().clone())));
            let id = entry.key().clone();
            entry.or_insert(room.clone());
            break (id, room);
        }
    }

    pub fn find_room(&self, room_id: &str) -> Result<RoomHandle, GameError> {
        self.rooms
            .get(room_id)
            .map(|room| room.clone())
            .ok_or(GameError::RoomNotFound)
    }

    pub fn num_rooms(&self) -> usize {
        self.rooms.len()
    }

    fn random_id() -> String {
        let mut rng = rand::thread_rng();
        (0..4).map(|_| rng.gen_range('A'..='Z')).collect()
    }
}

impl Room {
    fn new(id: String) -> Self {
        Self {
            id,
            state: RoomState::Lobby { seats: vec![] },
            night_actions: BTreeMap::new(),
            vote_actions: BTreeMap::new(),
            last_words: BTreeMap::new(),
            player_states: (0..MAX_PLAYERS).map(|_| watch::channel(Value::Null).0).collect(),
            host: None,
            timer_gen: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_host(&self, player_id: usize) -> bool {
        self.host == Some(player_id)
    }

    pub fn timer_gen(&self) -> u64 {
        self.timer_gen
    }

    pub fn phase(&self) -> Option<Phase> {
        match &self.state {
            RoomState::Lobby { .. } => None,
            RoomState::Playing { game, .. } => Some(game.phase()),
        }
    }

    pub fn game_over(&self) -> bool {
        match &self.state {
            RoomState::Lobby { .. } => false,
            RoomState::Playing { game, .. } => game.game_over(),
        }
    }

    /// Claims the lowest free seat, or reattaches to an existing seat by
    /// name when the game is already running.
    pub fn join(&mut self, name: &str) -> Result<(usize, watch::Receiver<Value>), GameError> {
        let seat_id = match &mut self.state {
            RoomState::Lobby { seats } => {
                let seat_id = (0..MAX_PLAYERS)
                    .find(|id| !seats.iter().any(|s| s.player_id == *id))
                    .ok_or(GameError::RoomFull)?;
                seats.push(Seat { player_id: seat_id, name: name.to_string() });
                seat_id
            }
            RoomState::Playing { seats, .. } => seats
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.player_id)
                .ok_or(GameError::GameAlreadyStarted)?,
        };
        if self.host.is_none() {
            self.host = Some(seat_id);
        }
        let rx = self.player_states[seat_id].subscribe();
        self.notify();
        Ok((seat_id, rx))
    }

    /// Called on disconnect: frees the lobby seat and discards any buffered
    /// input. A running game keeps the seat; an absent human simply submits
    /// nothing.
    pub fn leave(&mut self, player_id: usize) {
        self.night_actions.remove(&player_id);
        self.vote_actions.remove(&player_id);
        self.last_words.remove(&player_id);
        if let RoomState::Lobby { seats } = &mut self.state {
            seats.retain(|s| s.player_id != player_id);
            if self.host == Some(player_id) {
                self.host = seats.first().map(|s| s.player_id);
            }
            self.notify();
        }
    }

    /// Starts the game with the lobby's seats as the human players.
    pub fn start(
        &mut self,
        player_id: usize,
        theme: Theme,
        difficulty: Difficulty,
        seed: u64,
    ) -> Result<(), GameError> {
        if !self.is_host(player_id) {
            return Err(GameError::NotHost);
        }
        let RoomState::Lobby { seats } = &self.state else {
            return Err(GameError::GameAlreadyStarted);
        };
        let seats = seats.clone();
        let assignments: Vec<SeatAssignment> = seats
            .iter()
            .map(|s| SeatAssignment { seat: s.player_id, name: s.name.clone() })
            .collect();
        let game = Game::new(seed, theme, difficulty, &assignments);
        log::info!(
            "Room {}: game started with {} humans, theme {}, seed {}",
            self.id,
            assignments.len(),
            theme.name(),
            seed
        );
        self.state = RoomState::Playing { game, seats };
        self.clear_buffers();
        self.timer_gen += 1;
        self.notify();
        Ok(())
    }

    /// Buffers (or retracts) a player's night action. Last write wins.
    pub fn buffer_night_action(
        &mut self,
        player_id: usize,
        action: Option<NightAction>,
    ) -> Result<(), GameError> {
        if player_id >= MAX_PLAYERS {
            return Err(GameError::InvalidPlayerIndex);
        }
        let RoomState::Playing { game, .. } = &self.state else {
            return Err(GameError::GameNotStarted);
        };
        if game.phase() != Phase::Night {
            return Err(GameError::WrongPhase);
        }
        match action {
            Some(action) => {
                self.night_actions.insert(player_id, action);
            }
            None => {
                self.night_actions.remove(&player_id);
            }
        }
        Ok(())
    }

    /// Buffers (or retracts) a player's vote and optional last words.
    pub fn buffer_vote(
        &mut self,
        player_id: usize,
        target_id: Option<usize>,
        last_words: Option<String>,
    ) -> Result<(), GameError> {
        if player_id >= MAX_PLAYERS {
            return Err(GameError::InvalidPlayerIndex);
        }
        let RoomState::Playing { game, .. } = &self.state else {
            return Err(GameError::GameNotStarted);
        };
        if game.phase() != Phase::Vote {
            return Err(GameError::WrongPhase);
        }
        match target_id {
            Some(target_id) => {
                self.vote_actions.insert(player_id, target_id);
            }
            None => {
                self.vote_actions.remove(&player_id);
            }
        }
        if let Some(words) = last_words {
            self.last_words.insert(player_id, words);
        }
        Ok(())
    }

    /// Resolves the night with the buffered human actions. `by` is the
    /// requesting player for the host check; timers pass `None`.
    pub fn resolve_night_now(&mut self, by: Option<usize>) -> Result<(), GameError> {
        if let Some(player_id) = by {
            if !self.is_host(player_id) {
                return Err(GameError::NotHost);
            }
        }
        let RoomState::Playing { game, .. } = &mut self.state else {
            return Err(GameError::GameNotStarted);
        };
        let inputs = NightInputs {
            human_actions: std::mem::take(&mut self.night_actions),
            include_human: false,
        };
        game.resolve_night(None, &inputs);
        self.timer_gen += 1;
        self.notify();
        Ok(())
    }

    /// The explicit DAY to VOTE transition; only reveals the vote controls.
    pub fn advance_to_vote(&mut self) {
        if let RoomState::Playing { game, .. } = &mut self.state {
            game.begin_vote();
            self.timer_gen += 1;
            self.notify();
        }
    }

    /// Resolves the vote with the buffered human votes and last words.
    pub fn resolve_vote_now(&mut self, by: Option<usize>) -> Result<(), GameError> {
        if let Some(player_id) = by {
            if !self.is_host(player_id) {
                return Err(GameError::NotHost);
            }
        }
        let RoomState::Playing { game, .. } = &mut self.state else {
            return Err(GameError::GameNotStarted);
        };
        let inputs = VoteInputs {
            human_votes: std::mem::take(&mut self.vote_actions),
            last_words_by_player: std::mem::take(&mut self.last_words),
            include_human: false,
        };
        game.resolve_vote(None, "", &inputs);
        self.timer_gen += 1;
        self.notify();
        Ok(())
    }

    /// Day-phase discussion chat.
    pub fn chat(&mut self, player_id: usize, text: &str) -> Result<(), GameError> {
        let RoomState::Playing { game, .. } = &mut self.state else {
            return Err(GameError::GameNotStarted);
        };
        if game.phase() != Phase::Day {
            return Err(GameError::WrongPhase);
        }
        game.push_chat_line(player_id, text);
        self.notify();
        Ok(())
    }

    /// Returns the room to the lobby, keeping the seats.
    pub fn restart(&mut self, player_id: usize) -> Result<(), GameError> {
        if !self.is_host(player_id) {
            return Err(GameError::NotHost);
        }
        let seats = match &self.state {
            RoomState::Lobby { seats } => seats.clone(),
            RoomState::Playing { seats, .. } => seats.clone(),
        };
        self.state = RoomState::Lobby { seats };
        self.clear_buffers();
        self.timer_gen += 1;
        self.notify();
        Ok(())
    }

    fn clear_buffers(&mut self) {
        self.night_actions.clear();
        self.vote_actions.clear();
        self.last_words.clear();
    }

    /// Pushes the current state to every connected player: the lobby
    /// roster, or each player's visibility-filtered view.
    fn notify(&mut self) {
        match &self.state {
            RoomState::Lobby { seats } => {
                let roster: Vec<Value> = seats
                    .iter()
                    .map(|s| json!({ "playerId": s.player_id, "name": s.name }))
                    .collect();
                for seat in seats {
                    let state = json!({ "type": "lobby", "seats": roster });
                    self.player_states[seat.player_id].send_replace(state);
                }
            }
            RoomState::Playing { game, seats } => {
                for seat in seats {
                    let view = game
                        .build_player_view(seat.player_id)
                        .and_then(|v| serde_json::to_value(v).ok())
                        .unwrap_or(Value::Null);
                    let state = json!({ "type": "view", "view": view });
                    self.player_states[seat.player_id].send_replace(state);
                }
            }
        }
    }
}

/// Arms the advisory timer for the room's current phase. When it expires
/// the room resolves (or advances) and the timer is re-armed, unless the
/// phase already changed through a host command in the meantime.
pub fn arm_phase_timer(handle: RoomHandle) {
    let (gen, phase) = {
        let Ok(room) = handle.lock() else { return };
        if room.game_over() {
            return;
        }
        let Some(phase) = room.phase() else { return };
        (room.timer_gen(), phase)
    };
    let duration = match phase {
        Phase::Night => NIGHT_DURATION,
        Phase::Day => DAY_DURATION,
        Phase::Vote => VOTE_DURATION,
        Phase::End => return,
    };
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        let advanced = {
            let Ok(mut room) = handle.lock() else { return };
            if room.timer_gen() != gen {
                return;
            }
            match phase {
                Phase::Night => room.resolve_night_now(None).is_ok(),
                Phase::Day => {
                    room.advance_to_vote();
                    true
                }
                Phase::Vote => room.resolve_vote_now(None).is_ok(),
                Phase::End => false,
            }
        };
        if advanced {
            arm_phase_timer(handle);
        }
    });
}
