//! The suspicion model and AI decision making.
//!
//! Every non-human player keeps a belief score in (0,1) per living target.
//! Scores are initialized from faction-aware randomness, drift a little each
//! round, get nudged by behavioral signals from the previous vote (mentions,
//! flip-flopping, vote order, bandwagoning, an exposed red player), and are
//! re-normalized per actor so they never pile up at the extremes. The
//! concrete night actions, votes and chat lines all derive from these
//! scores.

use super::action::{NightAction, NightInputs, SubmittedAction};
use super::player::{FiendMode, Player};
use super::roles::{
    Difficulty, Faction, Role, MAX_DOCTOR_INJECTIONS, MAX_RIOT_GRENADES, MAX_SNIPER_SHOTS,
};
use super::Game;
use std::collections::{BTreeMap, BTreeSet};

const MAX_CHAT_LINES: usize = 6;

impl Game {
    /// Initializes, drifts and nudges every AI actor's suspicion scores,
    /// then re-normalizes them per actor into [0.05, 0.95].
    fn ensure_suspicion(&mut self) {
        let living: Vec<usize> = self.alive_players().map(|p| p.id).collect();
        let diff_scale = self.difficulty.suspicion_scale();
        let human_faction = self.human().map(|p| p.faction);
        let opposing_faction = match human_faction {
            Some(Faction::Red) => Some(Faction::Blue),
            Some(Faction::Blue) => Some(Faction::Red),
            _ => None,
        };
        let revealed_red = self.revealed_red;
        let nightmare = self.difficulty == Difficulty::Nightmare;

        let last_round = self.vote_history.last().cloned();
        let mention_max = last_round
            .as_ref()
            .and_then(|r| r.mentions.values().copied().max())
            .unwrap_or(0)
            .max(1) as f64;
        let flip_set: BTreeSet<usize> = last_round
            .as_ref()
            .map(|r| r.flips.iter().copied().collect())
            .unwrap_or_default();
        let first_voter = last_round.as_ref().and_then(|r| r.order.first().map(|v| v.actor));
        let last_voter = last_round.as_ref().and_then(|r| r.order.last().map(|v| v.actor));
        let last_tally: BTreeMap<usize, usize> =
            last_round.as_ref().map(|r| r.tally.clone()).unwrap_or_default();
        let tally_max = last_tally.values().copied().max().unwrap_or(0).max(1) as f64;

        let actor_ids: Vec<usize> =
            self.alive_players().filter(|p| !p.is_human).map(|p| p.id).collect();
        for actor_id in actor_ids {
            let actor_faction = self.players[actor_id].faction;
            for &target_id in &living {
                if target_id == actor_id {
                    continue;
                }
                let target_faction = self.players[target_id].faction;
                let same_faction = target_faction == actor_faction;
                let base_start = if actor_faction == Faction::Blue { 0.32 } else { 0.35 };
                let base = base_start + self.rng.unit() * 0.35
                    - if same_faction { 0.15 } else { 0.0 };

                let existing = self.players[actor_id].suspicion.get(&target_id).copied();
                let mut score = match existing {
                    None => base.clamp(0.05, 0.95),
                    Some(value) => {
                        let drift = (self.rng.unit() - 0.5) * 0.08;
                        (value + drift).clamp(0.05, 0.95)
                    }
                };

                let mut delta = 0.0;
                if let Some(round) = &last_round {
                    if let Some(&m) = round.mentions.get(&target_id) {
                        if m > 0 {
                            delta += 0.05 * (m as f64 / mention_max) * diff_scale;
                        }
                    }
                }
                if flip_set.contains(&target_id) {
                    delta += 0.15 * diff_scale;
                }
                if last_voter == Some(target_id) {
                    delta += 0.15 * diff_scale;
                }
                if first_voter == Some(target_id) {
                    delta -= 0.05 * diff_scale;
                }
                let tally_score = last_tally.get(&target_id).copied().unwrap_or(0);
                if tally_score > 0 {
                    delta += 0.08 * (tally_score as f64 / tally_max) * diff_scale;
                }
                if revealed_red == Some(target_id) && actor_faction == Faction::Blue {
                    delta += 0.25 * diff_scale;
                }
                if nightmare {
                    if let Some(hf) = human_faction {
                        if target_faction == hf {
                            delta += 0.12 * diff_scale;
                        } else if opposing_faction == Some(target_faction) {
                            delta -= 0.05 * diff_scale;
                        }
                    }
                }
                score = (score + delta).clamp(0.01, 0.99);
                self.players[actor_id].suspicion.insert(target_id, score);
            }

            let suspicion = &mut self.players[actor_id].suspicion;
            let min_val = suspicion.values().copied().fold(1.0_f64, f64::min);
            let max_val = suspicion.values().copied().fold(0.0_f64, f64::max);
            let range = max_val - min_val;
            if range > 0.0 {
                for value in suspicion.values_mut() {
                    let norm = 0.05 + ((*value - min_val) / range) * 0.9;
                    *value = norm.clamp(0.01, 0.99);
                }
            }
        }
    }

    /// The living target the actor suspects most, among those passing the
    /// filter. Ties keep the earlier (lower-id) player.
    fn pick_target_by_suspicion<F>(&self, actor_id: usize, filter: F) -> Option<usize>
    where
        F: Fn(&Player) -> bool,
    {
        let actor = self.player(actor_id)?;
        let mut best = None;
        let mut best_score = -1.0;
        for target in self.alive_players() {
            if target.id == actor_id || !filter(target) {
                continue;
            }
            let score = actor.suspicion.get(&target.id).copied().unwrap_or(0.5);
            if score > best_score {
                best_score = score;
                best = Some(target.id);
            }
        }
        best
    }

    /// The target with the highest average suspicion across a group of
    /// actors; used so killers and police do not split their votes.
    fn pick_group_target<F>(&self, actor_ids: &[usize], filter: F) -> Option<usize>
    where
        F: Fn(&Player) -> bool,
    {
        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for target in self.alive_players().filter(|t| filter(t)) {
            let mut total = 0.0;
            let mut count = 0usize;
            for &actor_id in actor_ids {
                if actor_id == target.id {
                    continue;
                }
                if let Some(&s) = self.players[actor_id].suspicion.get(&target.id) {
                    total += s;
                    count += 1;
                }
            }
            if count == 0 {
                continue;
            }
            let avg = total / count as f64;
            if avg > best_score {
                best_score = avg;
                best = Some(target.id);
            }
        }
        best
    }

    /// A target declared by a human through the action buffer, picked
    /// uniformly when several humans declared one.
    fn pick_declared_target<F>(&mut self, declared: &[NightAction], is_kind: F) -> Option<usize>
    where
        F: Fn(NightAction) -> bool,
    {
        let candidates: Vec<usize> = declared
            .iter()
            .copied()
            .filter(|a| is_kind(*a))
            .filter_map(|a| a.target())
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let target = candidates[self.rng.index(candidates.len())];
        self.player(target).map(|p| p.id)
    }

    /// Generates one night action per AI-controlled living player.
    ///
    /// Killers and police first agree on a shared preferred target so their
    /// majority votes do not split; a human's declared preference overrides
    /// the consensus (killers always, police with p = 0.75).
    pub(super) fn build_ai_night_actions(
        &mut self,
        primary: Option<NightAction>,
        inputs: &NightInputs,
    ) -> Vec<SubmittedAction> {
        self.ensure_suspicion();
        let include_human = inputs.include_human;
        let mut actions: Vec<SubmittedAction> = vec![];

        let mut declared: Vec<NightAction> = inputs.human_actions.values().copied().collect();
        if let Some(action) = primary {
            declared.push(action);
        }

        // Shared killer target
        let killer_actors: Vec<usize> = self
            .alive_players()
            .filter(|p| p.role == Role::Killer && (!p.is_human || include_human))
            .map(|p| p.id)
            .collect();
        let human_killer_target =
            self.pick_declared_target(&declared, |a| matches!(a, NightAction::KillerVote { .. }));
        let mut shared_killer_target = human_killer_target;
        if shared_killer_target.is_none() {
            shared_killer_target = if self.rng.chance(0.6) {
                self.pick_group_target(&killer_actors, |t| {
                    t.faction != Faction::Red && t.role != Role::Killer
                })
            } else {
                None
            };
        }

        // Shared police target
        let police_actors: Vec<usize> = self
            .alive_players()
            .filter(|p| p.role == Role::Police && (!p.is_human || include_human))
            .map(|p| p.id)
            .collect();
        let buffered: Vec<NightAction> = inputs.human_actions.values().copied().collect();
        let human_police_target = self
            .pick_declared_target(&buffered, |a| matches!(a, NightAction::PoliceInvestigate { .. }));
        let mut shared_police_target = human_police_target
            .or_else(|| self.pick_group_target(&police_actors, |t| t.role != Role::Police));
        if shared_police_target.is_none() {
            let pool: Vec<usize> = self
                .alive_players()
                .filter(|t| t.role != Role::Police)
                .map(|p| p.id)
                .collect();
            shared_police_target = self.rng.choice(&pool);
        }
        let human_role = self.human().map(|p| p.role);
        if let (Some(action), Some(Role::Police)) = (primary, human_role) {
            if let Some(target) = action.target() {
                if self.rng.chance(0.75) {
                    shared_police_target = self.player(target).map(|p| p.id).or(shared_police_target);
                }
            }
        }

        let actor_ids: Vec<usize> = self.alive_players().map(|p| p.id).collect();
        for actor_id in actor_ids {
            let (role, is_human, faction, fiend_mode, souls, last_kidnap) = {
                let p = &self.players[actor_id];
                (p.role, p.is_human, p.faction, p.status.fiend_mode, p.souls, p.last_kidnap_target)
            };
            if is_human && !include_human {
                continue;
            }
            let push = |actions: &mut Vec<SubmittedAction>, action: NightAction| {
                actions.push(SubmittedAction { actor_id, action });
            };
            match role {
                Role::Police => {
                    let target = shared_police_target
                        .or_else(|| self.pick_target_by_suspicion(actor_id, |t| t.role != Role::Police));
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::PoliceInvestigate { target_id });
                    }
                }
                Role::Killer => {
                    let target = shared_killer_target.or_else(|| {
                        self.pick_target_by_suspicion(actor_id, |t| {
                            t.faction != Faction::Red && t.role != Role::Killer
                        })
                    });
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::KillerVote { target_id });
                    }
                }
                Role::Doctor => {
                    if self.usage.doctor_injections < MAX_DOCTOR_INJECTIONS {
                        let target = if self.rng.unit() > 0.7 {
                            Some(actor_id)
                        } else {
                            self.pick_target_by_suspicion(actor_id, |t| t.faction == Faction::Blue)
                        };
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::DoctorInject { target_id });
                        }
                    }
                }
                Role::Sniper => {
                    if self.usage.sniper_shots < MAX_SNIPER_SHOTS && self.rng.unit() > 0.4 {
                        let target =
                            self.pick_target_by_suspicion(actor_id, |t| t.faction != faction);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::SniperShot { target_id });
                        }
                    }
                }
                Role::Agent => {
                    let target =
                        self.pick_target_by_suspicion(actor_id, |t| t.faction == Faction::Blue);
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::AgentProtect { target_id });
                    }
                }
                Role::HeavenlyFiend => {
                    if fiend_mode == Some(FiendMode::Absorb) {
                        let target =
                            self.pick_target_by_suspicion(actor_id, |t| t.faction == Faction::Blue);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::FiendProtect { target_id });
                        }
                    } else {
                        let target =
                            self.pick_target_by_suspicion(actor_id, |t| t.faction != Faction::Blue);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::FiendShoot { target_id });
                        }
                    }
                }
                Role::Terrorist => {
                    let target =
                        self.pick_target_by_suspicion(actor_id, |t| t.faction != Faction::Red);
                    if let Some(target_id) = target {
                        if self.rng.unit() > 0.35 {
                            push(&mut actions, NightAction::TerrorBomb { target_id });
                        }
                    }
                }
                Role::Cowboy => {
                    let target = self.pick_target_by_suspicion(actor_id, |_| true);
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::CowboyGamble { target_id });
                    }
                }
                Role::Kidnapper => {
                    let target = self.pick_target_by_suspicion(actor_id, |t| {
                        t.faction != Faction::Red && Some(t.id) != last_kidnap
                    });
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::Kidnap { target_id });
                    }
                }
                Role::Zombie => {
                    let target =
                        self.pick_target_by_suspicion(actor_id, |t| t.role != Role::Zombie);
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::ZombieBite { target_id });
                    }
                }
                Role::RiotPolice => {
                    if self.usage.riot_grenades < MAX_RIOT_GRENADES {
                        let target =
                            self.pick_target_by_suspicion(actor_id, |t| t.faction != Faction::Blue);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::RiotSmoke { target_id });
                        }
                    }
                }
                Role::Arsonist => {
                    let marked = self
                        .players
                        .iter()
                        .filter(|p| p.status.arson_marked && p.alive)
                        .count();
                    if marked >= 2 || self.rng.unit() > 0.65 {
                        push(&mut actions, NightAction::ArsonIgnite);
                    } else {
                        let target = self.pick_target_by_suspicion(actor_id, |_| true);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::ArsonMark { target_id });
                        }
                    }
                }
                Role::VineDemon => {
                    let target =
                        self.pick_target_by_suspicion(actor_id, |t| t.faction == Faction::Blue);
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::VineSeed { target_id });
                    }
                }
                Role::NightmareDemon => {
                    let target = self.pick_target_by_suspicion(actor_id, |_| true);
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::NightmareAttack { target_id });
                    }
                }
                Role::Exorcist => {
                    let target = self.pick_target_by_suspicion(actor_id, |_| true);
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::ExorcistStrike { target_id });
                    }
                }
                Role::Necromancer => {
                    if souls >= 2 {
                        let target = self.pick_target_by_suspicion(actor_id, |_| true);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::NecromancerCurse { target_id });
                        }
                    }
                }
                Role::Purifier => {
                    let target = self.pick_target_by_suspicion(actor_id, |_| true);
                    if let Some(target_id) = target {
                        push(&mut actions, NightAction::Purify { target_id });
                    }
                }
                Role::GrudgeBeast => {
                    if self.grudge_berserk {
                        let target = self
                            .pick_target_by_suspicion(actor_id, |t| t.role != Role::GrudgeBeast);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::GrudgeKillVote { target_id });
                        }
                    } else {
                        let target = self.pick_target_by_suspicion(actor_id, |_| true);
                        if let Some(target_id) = target {
                            push(&mut actions, NightAction::GrudgeJudge { target_id });
                        }
                    }
                }
                Role::Brat | Role::Civilian => {}
            }
        }
        actions
    }

    /// Generates one execution vote per AI voter, as (actor, target) pairs.
    ///
    /// A revealed red player forces bandwagon votes (police always, other
    /// blues with p = 0.7); otherwise each voter rolls between a uniformly
    /// random target and a jittered suspicion pick. The last AI voter never
    /// abstains, so the tally is non-empty whenever any AI is alive.
    pub(super) fn build_ai_votes(
        &mut self,
        excluded: Option<usize>,
        include_human: bool,
    ) -> Vec<(usize, usize)> {
        self.ensure_suspicion();

        let mut chat_mentions: BTreeMap<usize, usize> = BTreeMap::new();
        for line in &self.day_chat {
            for p in &self.players {
                if line.contains(&p.name) {
                    *chat_mentions.entry(p.id).or_default() += 1;
                }
            }
        }
        let max_mention = chat_mentions.values().copied().max().unwrap_or(0).max(1) as f64;

        let voters: Vec<usize> = self
            .alive_players()
            .filter(|p| include_human || !p.is_human)
            .filter(|p| !(p.role == Role::Brat && p.status.brat_revived))
            .map(|p| p.id)
            .collect();
        let human_faction = self.human().map(|p| p.faction);
        let nightmare = self.difficulty == Difficulty::Nightmare;

        let mut votes: Vec<(usize, usize)> = vec![];
        for (idx, &actor_id) in voters.iter().enumerate() {
            let abstain_chance = if idx == voters.len() - 1 { 0.0 } else { 0.05 };
            if self.rng.unit() < abstain_chance {
                continue;
            }
            let mode = self.rng.weighted_index(&[0.6, 0.4]);
            let actor_faction = self.players[actor_id].faction;
            let actor_role = self.players[actor_id].role;
            let everyone: Vec<usize> = self
                .alive_players()
                .filter(|t| t.id != actor_id && Some(t.id) != excluded)
                .map(|p| p.id)
                .collect();

            if let Some(red_id) = self.revealed_red {
                let red_alive = self.player(red_id).map_or(false, |p| p.alive);
                if red_alive && actor_role == Role::Police {
                    votes.push((actor_id, red_id));
                    continue;
                }
                if red_alive
                    && actor_faction == Faction::Blue
                    && actor_role != Role::Police
                    && self.rng.chance(0.7)
                {
                    votes.push((actor_id, red_id));
                    continue;
                }
            }

            let pruned: Vec<usize> = if actor_faction == Faction::Red {
                everyone
                    .iter()
                    .copied()
                    .filter(|&t| self.players[t].faction != Faction::Red)
                    .collect()
            } else {
                everyone.clone()
            };
            let candidates = if pruned.is_empty() { &everyone } else { &pruned };

            let target = if mode == 0 {
                self.rng.choice(candidates)
            } else {
                let mut best = None;
                let mut best_score = f64::NEG_INFINITY;
                for &t in candidates.iter() {
                    let base = self.players[actor_id].suspicion.get(&t).copied().unwrap_or(0.5);
                    let jittered = (base + (self.rng.unit() - 0.5) * 0.3).clamp(0.0, 1.0);
                    let chat_bonus = if actor_role != Role::Police {
                        (chat_mentions.get(&t).copied().unwrap_or(0) as f64 / max_mention) * 0.05
                    } else {
                        0.0
                    };
                    let mut score = (jittered + chat_bonus).clamp(0.0, 1.0);
                    if nightmare {
                        if let Some(hf) = human_faction {
                            let target_faction = self.players[t].faction;
                            if actor_faction != hf && target_faction == hf {
                                score += 0.1;
                            }
                            if actor_faction == hf && target_faction == actor_faction {
                                score -= 0.05;
                            }
                            score = score.clamp(0.0, 1.0);
                        }
                    }
                    if score > best_score {
                        best_score = score;
                        best = Some(t);
                    }
                }
                best.or_else(|| self.rng.choice(candidates))
            };
            if let Some(target_id) = target {
                votes.push((actor_id, target_id));
            }
        }

        if votes.is_empty() {
            if let Some(&actor_id) = voters.first() {
                if let Some(target_id) =
                    self.pick_target_by_suspicion(actor_id, |t| t.id != actor_id)
                {
                    votes.push((actor_id, target_id));
                }
            }
        }
        votes
    }

    /// Renders up to six day-chat lines. Speakers accuse out-faction
    /// targets, defend in-faction ones, and otherwise wonder aloud; the
    /// tone follows the speaker's suspicion of the chosen target.
    pub(super) fn generate_chat_lines(&mut self) -> Vec<String> {
        let mut lines: Vec<String> = vec![];
        let speakers: Vec<usize> =
            self.alive_players().filter(|p| !p.is_human).map(|p| p.id).collect();
        let red_found = self.revealed_red;

        for speaker_id in speakers {
            if lines.len() >= MAX_CHAT_LINES {
                break;
            }
            let speaker_faction = self.players[speaker_id].faction;
            let speaker_role = self.players[speaker_id].role;
            let all: Vec<usize> = self
                .alive_players()
                .filter(|t| t.id != speaker_id)
                .map(|p| p.id)
                .collect();
            let accuse_pool: Vec<usize> = if speaker_faction == Faction::Red {
                all.iter().copied().filter(|&t| self.players[t].faction != Faction::Red).collect()
            } else {
                all.clone()
            };
            let defend_pool: Vec<usize> = if speaker_faction == Faction::Red {
                all.iter().copied().filter(|&t| self.players[t].faction == Faction::Red).collect()
            } else {
                all.iter()
                    .copied()
                    .filter(|&t| self.players[t].faction == speaker_faction)
                    .collect()
            };

            let target = if self.rng.chance(0.5) {
                let pool = if accuse_pool.is_empty() { &all } else { &accuse_pool };
                self.rng.choice(pool)
            } else {
                let accuse = accuse_pool.clone();
                self.pick_target_by_suspicion(speaker_id, |t| {
                    accuse.contains(&t.id) || accuse.is_empty()
                })
            };

            let mut use_target = target;
            let red_alive =
                red_found.and_then(|id| self.player(id)).map_or(false, |p| p.alive);
            if red_alive && speaker_role == Role::Police && self.rng.chance(0.8) {
                use_target = red_found;
            }
            if speaker_faction == Faction::Red && self.rng.chance(0.75) {
                let non_red: Vec<usize> = all
                    .iter()
                    .copied()
                    .filter(|&t| self.players[t].faction != Faction::Red)
                    .collect();
                if let Some(t) = self.rng.choice(&non_red) {
                    use_target = Some(t);
                }
            }

            let suspicion = use_target
                .and_then(|t| self.players[speaker_id].suspicion.get(&t).copied())
                .unwrap_or(0.5);
            let speaker_name = self.players[speaker_id].name.clone();
            let named = |id: Option<usize>| -> Option<String> {
                id.and_then(|i| self.player(i)).map(|p| p.name.clone())
            };
            let line = if suspicion > 0.7 {
                let who = named(use_target).unwrap_or_else(|| "someone".into());
                format!("{}: {} feels off.", speaker_name, who)
            } else if suspicion < 0.3 && !defend_pool.is_empty() {
                let who = defend_pool
                    .first()
                    .and_then(|&i| self.player(i))
                    .map(|p| p.name.clone())
                    .or_else(|| named(use_target))
                    .unwrap_or_else(|| "someone".into());
                format!("{}: {} seems fine to me.", speaker_name, who)
            } else {
                let who = named(use_target).unwrap_or_else(|| "this".into());
                format!("{}: What's everyone thinking about {}?", speaker_name, who)
            };
            lines.push(line);
        }
        lines
    }
}
