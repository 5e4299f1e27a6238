//! The night resolution pipeline.
//!
//! All submitted actions (human and AI) resolve in a fixed stage order:
//! control effects first, then every other ability, then vine triggers,
//! majority decisions, arson, bite backlash, protection filtering, the
//! doctor, vine self-preservation, and finally the kill waves and post-kill
//! bookkeeping. The stages communicate through a [`NightContext`] of shared
//! tallies and kill intents instead of global state.

use super::action::{NightAction, NightInputs, SubmittedAction};
use super::player::FiendMode;
use super::roles::{
    DeathCause, Faction, Phase, Role, EMPTY_INJECTIONS_FATAL_AT, MAX_DOCTOR_INJECTIONS,
    MAX_RIOT_GRENADES, MAX_SNIPER_SHOTS, SMOKE_FATAL_AT, ZOMBIE_BITES_CONVERT_AT,
    ZOMBIE_BITES_FATAL_AT,
};
use super::{Game, IntelChannel};
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum KillTiming {
    Instant,
    Delayed,
}

/// A kill that has been decided but not yet applied.
///
/// `blockable` marks kills the doctor may cancel; `unstoppable` marks kills
/// that pierce agent and fiend protection. The two are independent flags:
/// an exorcist strike is neither doctor-cancellable nor protection-piercing.
#[derive(Clone, Copy, Debug)]
struct KillIntent {
    target: usize,
    cause: DeathCause,
    killer: Option<usize>,
    timing: KillTiming,
    blockable: bool,
    unstoppable: bool,
    requires_alive_actor: Option<usize>,
}

impl KillIntent {
    fn new(target: usize, cause: DeathCause) -> Self {
        Self {
            target,
            cause,
            killer: None,
            timing: KillTiming::Instant,
            blockable: true,
            unstoppable: cause.is_unblockable(),
            requires_alive_actor: None,
        }
    }

    fn by(mut self, killer: usize) -> Self {
        self.killer = Some(killer);
        self
    }

    fn unstoppable(mut self) -> Self {
        self.unstoppable = true;
        self
    }

    fn not_blockable(mut self) -> Self {
        self.blockable = false;
        self
    }

    fn delayed(mut self) -> Self {
        self.timing = KillTiming::Delayed;
        self
    }

    fn requires_alive(mut self, actor: usize) -> Self {
        self.requires_alive_actor = Some(actor);
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct DeathRecord {
    target: usize,
    killer: Option<usize>,
}

/// Shared tallies and intent queues for a single night resolution.
#[derive(Default)]
struct NightContext {
    killer_votes: BTreeMap<usize, usize>,
    police_votes: BTreeMap<usize, usize>,
    grudge_votes: BTreeMap<usize, usize>,
    /// Kidnapper id to victim id, for the ransom kill on investigation.
    kidnaps: BTreeMap<usize, usize>,
    /// Agent id to ward id: the ward dies if the agent dies tonight.
    agent_links: BTreeMap<usize, usize>,
    /// Vine demon id to seed target id.
    vine_seeds: BTreeMap<usize, usize>,
    /// Players targeted tonight by non-civilian BLUE actors, in action order.
    targeted_by_blue: BTreeMap<usize, Vec<usize>>,
    pending_kills: Vec<KillIntent>,
    delayed_kills: Vec<KillIntent>,
    bite_backlash: Vec<usize>,
    doctor_target: Option<usize>,
    arson_marked: Vec<usize>,
    arson_ignite: bool,
    night_deaths: Vec<DeathRecord>,
}

impl NightContext {
    fn add_kill(&mut self, kill: KillIntent) {
        self.pending_kills.push(kill);
    }
}

/// Picks the first target whose vote count meets the threshold, scanning in
/// ascending target order so ties break toward the lower id.
pub(super) fn majority_target(votes: &BTreeMap<usize, usize>, needed: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (&target, &count) in votes {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((target, count));
        }
    }
    best.and_then(|(target, count)| (count >= needed).then_some(target))
}

/// Highest raw count, ties toward the lower id.
pub(super) fn plurality_target(votes: &BTreeMap<usize, usize>) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (&target, &count) in votes {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((target, count));
        }
    }
    best.map(|(target, _)| target)
}

impl Game {
    /// Entry to night: apply queued zombie conversions, then clear the
    /// per-round transient status flags.
    fn begin_night(&mut self) {
        self.phase = Phase::Night;
        self.last_night_summary.clear();

        for idx in 0..self.players.len() {
            let p = &mut self.players[idx];
            if p.alive && p.status.pending_zombie_conversion {
                p.status.pending_zombie_conversion = false;
                p.turn_zombie();
                let name = p.name.clone();
                self.log_public(format!("{} turned into a zombie overnight.", name));
            }
        }
        for p in &mut self.players {
            p.status.reset_nightly();
        }
    }

    /// A blocked actor submits no effect this night.
    fn actor_blocked(&self, id: usize) -> bool {
        match self.player(id) {
            Some(p) => {
                !p.alive
                    || p.status.cannot_act
                    || p.status.smoked > 0
                    || p.status.kidnapped
                    || p.status.purified
            }
            None => true,
        }
    }

    /// Dead or smoked players cannot be targeted.
    fn untargetable(&self, id: usize) -> bool {
        match self.player(id) {
            Some(p) => !p.alive || p.status.smoked > 0,
            None => true,
        }
    }

    fn is_purified(&self, id: usize) -> bool {
        self.player(id).map_or(false, |p| p.status.purified)
    }

    /// Resolves a full night: collects AI and human actions, runs the stage
    /// pipeline, applies deaths, and moves to DAY (or END on a victory).
    ///
    /// `primary` is the single-human shorthand; additional per-seat actions
    /// arrive through `inputs`. Unknown actors and dead targets are ignored.
    pub fn resolve_night(&mut self, primary: Option<NightAction>, inputs: &NightInputs) {
        if self.victory.is_some() {
            return;
        }
        self.begin_night();

        let mut actions = self.build_ai_night_actions(primary, inputs);
        if let Some(action) = primary {
            if let Some(human_id) = self.human().map(|p| p.id) {
                actions.push(SubmittedAction { actor_id: human_id, action });
            }
        }
        for (&actor_id, &action) in &inputs.human_actions {
            actions.push(SubmittedAction { actor_id, action });
        }

        let mut ctx = NightContext {
            arson_marked: self
                .players
                .iter()
                .filter(|p| p.status.arson_marked)
                .map(|p| p.id)
                .collect(),
            ..NightContext::default()
        };

        let (control, other): (Vec<_>, Vec<_>) =
            actions.into_iter().partition(|s| s.action.is_control());

        self.apply_control_stage(&control, &mut ctx);
        self.apply_primary_stage(&other, &mut ctx);
        self.resolve_vine_triggers(&mut ctx);
        self.resolve_majorities(&mut ctx);
        self.resolve_arson(&mut ctx);
        self.resolve_bite_backlash(&mut ctx);

        let mut filtered = self.filter_protected_kills(&ctx);
        self.resolve_doctor(&mut ctx, &mut filtered);
        self.resolve_vine_self_preservation(&mut ctx, &mut filtered);
        self.apply_kill_waves(&mut ctx, &filtered);
        self.apply_agent_links(&mut ctx);

        for p in &mut self.players {
            p.status.zombie_bites = 0;
        }
        self.apply_grudge_trigger(&ctx);
        self.award_necromancer_souls(&ctx);

        self.phase = Phase::Day;
        self.day_chat = self.generate_chat_lines();
        let chat = self.day_chat.clone();
        self.public_log.extend(chat);
        self.update_winrate_hint();
        if self.check_victory().is_some() {
            self.phase = Phase::End;
        }
    }

    /// Stage 1: smoke, purify and kidnap, applied in submission order. These
    /// gate whether later actors can act or be targeted, so they only require
    /// a living actor and target.
    fn apply_control_stage(&mut self, actions: &[SubmittedAction], ctx: &mut NightContext) {
        for s in actions {
            let Some(target_id) = s.action.target() else { continue };
            let actor_alive = self.player(s.actor_id).map_or(false, |p| p.alive);
            let target_alive = self.player(target_id).map_or(false, |p| p.alive);
            if !actor_alive || !target_alive {
                continue;
            }
            match s.action {
                NightAction::RiotSmoke { .. } => {
                    if self.usage.riot_grenades >= MAX_RIOT_GRENADES {
                        continue;
                    }
                    self.usage.riot_grenades += 1;
                    debug_assert!(self.usage.riot_grenades <= MAX_RIOT_GRENADES);
                    let target = &mut self.players[target_id];
                    target.status.smoked += 1;
                    target.status.cannot_act = true;
                    if target.status.smoked >= SMOKE_FATAL_AT {
                        ctx.add_kill(KillIntent::new(target_id, DeathCause::SmokeOverdose));
                    } else {
                        let name = target.name.clone();
                        self.log_public(format!("Someone deployed smoke on {}.", name));
                    }
                }
                NightAction::Purify { .. } => {
                    let target = &mut self.players[target_id];
                    target.status.purified = true;
                    target.status.cannot_act = true;
                    if target.role == Role::Necromancer {
                        target.souls = 0;
                    }
                    let name = target.name.clone();
                    self.log_public(format!("Someone cleansed {}.", name));
                }
                NightAction::Kidnap { .. } => {
                    // The same actor may not kidnap the same target twice in a row.
                    if self.players[s.actor_id].last_kidnap_target == Some(target_id) {
                        continue;
                    }
                    ctx.kidnaps.insert(s.actor_id, target_id);
                    self.players[s.actor_id].last_kidnap_target = Some(target_id);
                    let target = &mut self.players[target_id];
                    target.status.kidnapped = true;
                    target.status.cannot_act = true;
                    let name = target.name.clone();
                    self.log_public(format!("Someone kidnapped {}.", name));
                }
                _ => {}
            }
        }
    }

    /// Stage 2: every remaining action, evaluated once, skipped when the
    /// actor was blocked by the control stage or is otherwise unable to act.
    fn apply_primary_stage(&mut self, actions: &[SubmittedAction], ctx: &mut NightContext) {
        for s in actions {
            if self.actor_blocked(s.actor_id) {
                continue;
            }
            let actor_id = s.actor_id;
            match s.action {
                NightAction::PoliceInvestigate { target_id } => {
                    if self.untargetable(target_id) || self.is_purified(target_id) {
                        continue;
                    }
                    *ctx.police_votes.entry(target_id).or_default() += 1;
                    self.track_blue_target(ctx, target_id, actor_id);
                }
                NightAction::KillerVote { target_id } => {
                    if self.untargetable(target_id) || self.is_purified(target_id) {
                        continue;
                    }
                    *ctx.killer_votes.entry(target_id).or_default() += 1;
                }
                NightAction::GrudgeKillVote { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    *ctx.grudge_votes.entry(target_id).or_default() += 1;
                }
                NightAction::DoctorInject { target_id } => {
                    ctx.doctor_target = Some(target_id);
                    self.track_blue_target(ctx, target_id, actor_id);
                }
                NightAction::SniperShot { target_id } => {
                    if self.usage.sniper_shots >= MAX_SNIPER_SHOTS {
                        continue;
                    }
                    if self.untargetable(target_id) {
                        continue;
                    }
                    self.usage.sniper_shots += 1;
                    debug_assert!(self.usage.sniper_shots <= MAX_SNIPER_SHOTS);
                    ctx.add_kill(KillIntent::new(target_id, DeathCause::SniperHeadshot).by(actor_id));
                    self.log_public("Someone fired a sniper shot.");
                }
                NightAction::AgentProtect { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    let target = &mut self.players[target_id];
                    target.status.protected_by_agent = true;
                    target.status.protection_source = Some(actor_id);
                    ctx.agent_links.insert(actor_id, target_id);
                    self.track_blue_target(ctx, target_id, actor_id);
                }
                NightAction::FiendProtect { target_id } => {
                    if self.players[actor_id].status.fiend_mode != Some(FiendMode::Absorb) {
                        continue;
                    }
                    if self.untargetable(target_id) {
                        continue;
                    }
                    let target = &mut self.players[target_id];
                    target.status.protected_by_fiend = true;
                    target.status.protection_source = Some(actor_id);
                    self.track_blue_target(ctx, target_id, actor_id);
                }
                NightAction::FiendShoot { target_id } => {
                    if self.players[actor_id].status.fiend_mode != Some(FiendMode::Charge) {
                        continue;
                    }
                    if self.untargetable(target_id) {
                        continue;
                    }
                    ctx.add_kill(KillIntent::new(target_id, DeathCause::FiendShot).by(actor_id));
                    self.players[actor_id].status.fiend_mode = Some(FiendMode::Absorb);
                }
                NightAction::TerrorBomb { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    if self.players[target_id].faction == Faction::Red {
                        ctx.add_kill(KillIntent::new(actor_id, DeathCause::TerrorBomb).by(actor_id));
                        self.log_public("A bomb went off but failed on an ally; the bomber died.");
                    } else {
                        ctx.add_kill(KillIntent::new(actor_id, DeathCause::TerrorBomb).by(actor_id));
                        ctx.add_kill(KillIntent::new(target_id, DeathCause::TerrorBomb).by(actor_id));
                        let name = self.players[target_id].name.clone();
                        self.log_public(format!("A bomb detonated on {}.", name));
                    }
                }
                NightAction::CowboyGamble { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    let roll = self.rng.unit();
                    if roll < 2.0 / 6.0 {
                        ctx.delayed_kills
                            .push(KillIntent::new(target_id, DeathCause::CowboyShot).by(actor_id).delayed());
                        let name = self.players[target_id].name.clone();
                        self.log_public(format!("Someone fired a risky shot at {}.", name));
                    } else if roll < 5.0 / 6.0 {
                        let name = self.players[target_id].name.clone();
                        self.log_public(format!("A cowboy's chamber clicked on {}.", name));
                    } else {
                        ctx.add_kill(KillIntent::new(target_id, DeathCause::CowboyShot).by(actor_id));
                        let others: Vec<usize> = self
                            .alive_players()
                            .filter(|p| p.id != actor_id && p.id != target_id)
                            .map(|p| p.id)
                            .collect();
                        let roll = self.rng.unit();
                        if !others.is_empty() {
                            let extra = others[(roll * others.len() as f64) as usize];
                            ctx.add_kill(
                                KillIntent::new(extra, DeathCause::CowboyBackfire).by(actor_id),
                            );
                        }
                        ctx.add_kill(KillIntent::new(actor_id, DeathCause::CowboyBackfire).by(actor_id));
                        self.log_public("A cowboy drew a wild bullet. Chaos ensued.");
                    }
                }
                NightAction::ZombieBite { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    let target = &mut self.players[target_id];
                    target.status.zombie_bites += 1;
                    if target.role == Role::Zombie {
                        ctx.bite_backlash.push(actor_id);
                    } else if target.status.zombie_bites >= ZOMBIE_BITES_FATAL_AT {
                        ctx.add_kill(KillIntent::new(target_id, DeathCause::ZombieFatal).by(actor_id));
                    } else if target.status.zombie_bites >= ZOMBIE_BITES_CONVERT_AT {
                        // Conversion takes effect at the next night-start.
                        target.status.pending_zombie_conversion = true;
                    }
                }
                NightAction::ArsonMark { target_id } => {
                    if self.player(target_id).map_or(false, |p| p.alive) {
                        self.players[target_id].status.arson_marked = true;
                        if !ctx.arson_marked.contains(&target_id) {
                            ctx.arson_marked.push(target_id);
                        }
                        let name = self.players[target_id].name.clone();
                        self.log_public(format!("Someone splashed fuel on {}.", name));
                    }
                }
                NightAction::ArsonIgnite => {
                    ctx.arson_ignite = true;
                    self.log_public("Someone prepared to ignite marked targets.");
                }
                NightAction::VineSeed { target_id } => {
                    if self.players[actor_id].status.vine_active
                        && self.player(target_id).map_or(false, |p| p.alive)
                    {
                        self.players[target_id].status.vine_seeded_by = Some(actor_id);
                        ctx.vine_seeds.insert(actor_id, target_id);
                    }
                }
                NightAction::NightmareAttack { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    let target = &self.players[target_id];
                    if matches!(target.role, Role::Civilian | Role::Brat) {
                        ctx.add_kill(
                            KillIntent::new(target_id, DeathCause::NightmareStrike).by(actor_id),
                        );
                    } else {
                        let line = format!(
                            "{} learned {} is {}.",
                            self.players[actor_id].name,
                            target.name,
                            target.role.as_str()
                        );
                        self.log_intel(IntelChannel::Killer, line);
                    }
                }
                NightAction::ExorcistStrike { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    if self.players[actor_id].chains_left == 0 {
                        continue;
                    }
                    ctx.add_kill(
                        KillIntent::new(target_id, DeathCause::ExorcistPetrify)
                            .by(actor_id)
                            .not_blockable(),
                    );
                    let target = &self.players[target_id];
                    if target.faction != Faction::Red && target.role != Role::Zombie {
                        self.players[actor_id].chains_left -= 1;
                    }
                }
                NightAction::NecromancerCurse { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    if self.players[actor_id].souls < 2 {
                        continue;
                    }
                    let souls = self.players[actor_id].souls.min(4);
                    self.players[actor_id].souls = 0;
                    if souls >= 4 {
                        ctx.add_kill(
                            KillIntent::new(target_id, DeathCause::NecromancerCurse)
                                .by(actor_id)
                                .not_blockable()
                                .unstoppable(),
                        );
                    } else if souls == 3 {
                        ctx.add_kill(
                            KillIntent::new(target_id, DeathCause::NecromancerCurse)
                                .by(actor_id)
                                .not_blockable(),
                        );
                    } else {
                        ctx.delayed_kills.push(
                            KillIntent::new(target_id, DeathCause::NecromancerCurse)
                                .by(actor_id)
                                .delayed()
                                .requires_alive(actor_id),
                        );
                    }
                }
                NightAction::GrudgeJudge { target_id } => {
                    if self.untargetable(target_id) {
                        continue;
                    }
                    let target = &self.players[target_id];
                    if target.faction == Faction::Red {
                        let line =
                            format!("Grudge intel: {} is {}.", target.name, target.role.as_str());
                        self.log_intel(IntelChannel::Police, line);
                    } else if target.faction == Faction::Blue && target.role != Role::Civilian {
                        let line =
                            format!("Grudge intel: {} is {}.", target.name, target.role.as_str());
                        self.log_intel(IntelChannel::Killer, line);
                    } else if target.role == Role::Civilian {
                        // Judging a plain civilian is the beast's own undoing.
                        ctx.add_kill(KillIntent::new(actor_id, DeathCause::GrudgePunish).by(actor_id));
                    }
                }
                // Control actions were consumed by stage 1.
                NightAction::RiotSmoke { .. }
                | NightAction::Purify { .. }
                | NightAction::Kidnap { .. } => {}
            }
        }
    }

    fn track_blue_target(&self, ctx: &mut NightContext, target_id: usize, actor_id: usize) {
        let Some(actor) = self.player(actor_id) else { return };
        if actor.faction != Faction::Blue || actor.role == Role::Civilian {
            return;
        }
        ctx.targeted_by_blue.entry(target_id).or_default().push(actor_id);
    }

    /// Stage 3: a seeded target who was also targeted by a non-civilian BLUE
    /// actor triggers a swap-kill of both the seed target and the first such
    /// blue actor; the demon's seed is spent.
    fn resolve_vine_triggers(&mut self, ctx: &mut NightContext) {
        let seeds: Vec<(usize, usize)> = ctx.vine_seeds.iter().map(|(&a, &b)| (a, b)).collect();
        for (demon_id, seed_target) in seeds {
            let demon_alive = self.player(demon_id).map_or(false, |p| p.alive);
            let target_alive = self.player(seed_target).map_or(false, |p| p.alive);
            if !demon_alive || !target_alive {
                continue;
            }
            let Some(blues) = ctx.targeted_by_blue.get(&seed_target) else { continue };
            let Some(&first_blue) = blues.first() else { continue };
            ctx.add_kill(KillIntent::new(seed_target, DeathCause::VineSwap).by(demon_id));
            ctx.add_kill(KillIntent::new(first_blue, DeathCause::VineSwap).by(demon_id));
            self.players[demon_id].status.vine_active = false;
        }
    }

    /// Stage 4: killer, berserk-grudge and police tallies resolve by strict
    /// majority of living, unblocked role holders; no-majority falls back to
    /// plurality and then the rng-gated random-target chain.
    fn resolve_majorities(&mut self, ctx: &mut NightContext) {
        let living_unblocked = |game: &Game, role: Role| {
            game.alive_players()
                .filter(|p| p.role == role)
                .filter(|p| !game.actor_blocked(p.id))
                .count()
        };

        // Killers
        let killers_alive = living_unblocked(self, Role::Killer);
        let killer_needed = killers_alive / 2 + 1;
        let mut killer_target = majority_target(&ctx.killer_votes, killer_needed);
        if killer_target.is_none() && !ctx.killer_votes.is_empty() {
            killer_target = plurality_target(&ctx.killer_votes);
        }
        if killer_target.is_none() && killers_alive > 0 && self.rng.chance(0.5) {
            killer_target = self.random_kill_fallback(true);
        }
        if killer_target.is_none() && killers_alive > 0 && self.rng.chance(0.5) {
            killer_target = self.random_kill_fallback(false);
        }
        if killer_target.is_none() && killers_alive > 0 && self.rng.chance(0.2) {
            killer_target = self.random_kill_fallback(true);
        }
        if killer_target.is_none() && killers_alive > 0 && self.rng.chance(0.2) {
            killer_target = self.random_kill_fallback(false);
        }
        if let Some(target_id) = killer_target {
            if !self.is_purified(target_id) && !self.untargetable(target_id) {
                ctx.add_kill(KillIntent::new(target_id, DeathCause::KillerMurder));
                let name = self.players[target_id].name.clone();
                self.log_intel(IntelChannel::Killer, format!("Killers targeted {}.", name));
            }
        } else if killers_alive > 0 {
            self.log_intel(IntelChannel::Killer, "Killers failed to agree on a target.");
        }

        // Berserk grudge beasts
        if self.grudge_berserk {
            let grudge_alive = living_unblocked(self, Role::GrudgeBeast);
            let needed = grudge_alive / 2 + 1;
            if let Some(target_id) = majority_target(&ctx.grudge_votes, needed) {
                if !self.untargetable(target_id) {
                    ctx.add_kill(KillIntent::new(target_id, DeathCause::GrudgePunish));
                }
            }
        }

        // Police
        let police_alive = living_unblocked(self, Role::Police);
        let police_needed = police_alive / 2 + 1;
        let mut police_target = majority_target(&ctx.police_votes, police_needed);
        if police_target.is_none() && !ctx.police_votes.is_empty() {
            police_target = plurality_target(&ctx.police_votes);
        }
        if police_target.is_none() && police_alive > 0 {
            let pool: Vec<usize> = self
                .alive_players()
                .filter(|p| p.role != Role::Police)
                .filter(|p| !self.untargetable(p.id) && !p.status.purified)
                .map(|p| p.id)
                .collect();
            police_target = self.rng.choice(&pool);
        }
        if police_target.is_none() && police_alive > 0 {
            let pool: Vec<usize> = self
                .alive_players()
                .filter(|p| p.role != Role::Police)
                .map(|p| p.id)
                .collect();
            police_target = self.rng.choice(&pool);
        }
        if let Some(target_id) = police_target {
            let target = &self.players[target_id];
            let line = format!(
                "Investigation result: {} is {}",
                target.name,
                target.faction.as_str()
            );
            let reveal = target.faction == Faction::Red && target.alive;
            self.log_intel(IntelChannel::Police, line);
            if reveal {
                self.revealed_red = Some(target_id);
            }
            // Investigating a kidnapper triggers the ransom kill of the victim.
            if let Some(&victim) = ctx.kidnaps.get(&target_id) {
                ctx.add_kill(KillIntent::new(victim, DeathCause::KidnapExecution).by(target_id));
            }
        } else if police_alive > 0 {
            self.log_intel(IntelChannel::Police, "Police could not agree on a target.");
        }
    }

    /// An eligible victim for the killers' random fallback. The strict pool
    /// excludes untargetable and purified players; the loose pool does not.
    fn random_kill_fallback(&mut self, strict: bool) -> Option<usize> {
        let pool: Vec<usize> = self
            .players
            .iter()
            .filter(|p| p.alive && p.faction != Faction::Red && p.role != Role::Killer)
            .filter(|p| !strict || (!self.untargetable(p.id) && !p.status.purified))
            .map(|p| p.id)
            .collect();
        self.rng.choice(&pool)
    }

    /// Stage 5: ignition burns every fuel-marked living player and clears
    /// all marks.
    fn resolve_arson(&mut self, ctx: &mut NightContext) {
        if !ctx.arson_ignite || ctx.arson_marked.is_empty() {
            return;
        }
        for i in 0..ctx.arson_marked.len() {
            let target_id = ctx.arson_marked[i];
            if self.player(target_id).map_or(false, |p| p.alive) {
                ctx.add_kill(KillIntent::new(target_id, DeathCause::ArsonBurn));
            }
        }
        for p in &mut self.players {
            p.status.arson_marked = false;
        }
    }

    /// Stage 6 (part): biting a zombie backfires fatally on the biter.
    fn resolve_bite_backlash(&mut self, ctx: &mut NightContext) {
        for i in 0..ctx.bite_backlash.len() {
            let biter = ctx.bite_backlash[i];
            if self.player(biter).map_or(false, |p| p.alive) {
                ctx.add_kill(KillIntent::new(biter, DeathCause::ZombieFatal).unstoppable());
            }
        }
    }

    /// Stage 7: agent protection drops blockable kills outright; fiend
    /// protection drops the kill and flips the absorbing fiend into charge
    /// mode. Unstoppable kills pass straight through.
    fn filter_protected_kills(&mut self, ctx: &NightContext) -> Vec<KillIntent> {
        let mut filtered = vec![];
        let mut absorbed: Vec<usize> = vec![];
        for k in &ctx.pending_kills {
            let Some(target) = self.player(k.target) else { continue };
            if !target.alive {
                continue;
            }
            if !k.unstoppable {
                if target.status.protected_by_agent {
                    continue;
                }
                if target.status.protected_by_fiend {
                    if let Some(source) = target.status.protection_source {
                        if !absorbed.contains(&source) {
                            absorbed.push(source);
                        }
                    }
                    continue;
                }
            }
            filtered.push(*k);
        }
        for fiend_id in absorbed {
            if let Some(fiend) = self.players.get_mut(fiend_id) {
                fiend.status.fiend_mode = Some(FiendMode::Charge);
            }
        }
        filtered
    }

    /// Stage 8: the doctor's injection cancels a still-pending blockable kill
    /// of a revivable cause; otherwise it counts as an empty injection, and
    /// the second empty injection on the same target is itself fatal.
    fn resolve_doctor(&mut self, ctx: &mut NightContext, filtered: &mut Vec<KillIntent>) {
        let Some(doctor_id) = self
            .players
            .iter()
            .find(|p| p.role == Role::Doctor && p.alive)
            .map(|p| p.id)
        else {
            return;
        };
        let Some(target_id) = ctx.doctor_target else { return };
        if self.usage.doctor_injections >= MAX_DOCTOR_INJECTIONS {
            return;
        }
        if self.players[doctor_id].status.cannot_act {
            return;
        }
        self.usage.doctor_injections += 1;
        debug_assert!(self.usage.doctor_injections <= MAX_DOCTOR_INJECTIONS);
        if !self.player(target_id).map_or(false, |p| p.alive) {
            return;
        }

        let before = filtered.len();
        filtered.retain(|k| {
            !(k.target == target_id && k.blockable && k.cause.is_doctor_revivable())
        });
        let name = self.players[target_id].name.clone();
        if filtered.len() != before {
            self.log_public(format!("Someone saved {} from death.", name));
        } else {
            self.players[target_id].empty_injections += 1;
            let doses = self.players[target_id].empty_injections;
            if doses >= EMPTY_INJECTIONS_FATAL_AT {
                filtered.push(
                    KillIntent::new(target_id, DeathCause::EmptyInjection)
                        .by(doctor_id)
                        .not_blockable()
                        .unstoppable(),
                );
            }
            self.log_public(format!(
                "Someone injected {} (dose {}/{}).",
                name, doses, EMPTY_INJECTIONS_FATAL_AT
            ));
        }
    }

    /// Stage 9: a dying vine demon with an unconsumed seed redirects the
    /// kill onto the seed target instead.
    fn resolve_vine_self_preservation(
        &mut self,
        ctx: &mut NightContext,
        filtered: &mut Vec<KillIntent>,
    ) {
        let mut swaps: Vec<(usize, usize)> = vec![];
        let mut consumed: Vec<usize> = vec![];
        filtered.retain(|k| {
            let Some(target) = self.player(k.target) else { return true };
            if target.role != Role::VineDemon || consumed.contains(&k.target) {
                return true;
            }
            let Some(&seed_target) = ctx.vine_seeds.get(&k.target) else { return true };
            if !self.player(seed_target).map_or(false, |p| p.alive) {
                return true;
            }
            swaps.push((k.target, seed_target));
            consumed.push(k.target);
            false
        });
        for (demon_id, seed_target) in swaps {
            self.players[demon_id].status.vine_active = false;
            ctx.vine_seeds.remove(&demon_id);
            filtered.push(
                KillIntent::new(seed_target, DeathCause::VineSwap)
                    .by(demon_id)
                    .not_blockable(),
            );
        }
    }

    /// Stage 10: kills apply in three waves (instant, delayed, remaining),
    /// each skipping already-dead targets and honoring the alive-actor
    /// precondition.
    fn apply_kill_waves(&mut self, ctx: &mut NightContext, filtered: &[KillIntent]) {
        let delayed = std::mem::take(&mut ctx.delayed_kills);
        for k in filtered.iter().filter(|k| k.timing == KillTiming::Instant) {
            self.apply_kill(&mut ctx.night_deaths, k);
        }
        for k in &delayed {
            self.apply_kill(&mut ctx.night_deaths, k);
        }
        for k in filtered.iter().filter(|k| k.timing == KillTiming::Delayed) {
            self.apply_kill(&mut ctx.night_deaths, k);
        }
    }

    fn apply_kill(&mut self, deaths: &mut Vec<DeathRecord>, k: &KillIntent) {
        let target_alive = self.player(k.target).map_or(false, |p| p.alive);
        let actor_ok = k
            .requires_alive_actor
            .map_or(true, |actor| self.player(actor).map_or(false, |p| p.alive));
        if target_alive && actor_ok {
            self.mark_death(k.target, k.cause);
            deaths.push(DeathRecord { target: k.target, killer: k.killer });
        }
    }

    /// Stage 11 (part): an agent who died tonight takes their ward with them.
    fn apply_agent_links(&mut self, ctx: &mut NightContext) {
        let links: Vec<(usize, usize)> = ctx.agent_links.iter().map(|(&a, &b)| (a, b)).collect();
        for (agent_id, ward_id) in links {
            let agent_dead = self.player(agent_id).map_or(false, |p| !p.alive);
            let ward_alive = self.player(ward_id).map_or(false, |p| p.alive);
            if agent_dead && ward_alive {
                self.mark_death(ward_id, DeathCause::AgentLink);
                ctx.night_deaths
                    .push(DeathRecord { target: ward_id, killer: Some(agent_id) });
            }
        }
    }

    /// Stage 11 (part): berserk is a one-way switch, thrown the first time
    /// any grudge beast dies.
    fn apply_grudge_trigger(&mut self, ctx: &NightContext) {
        if self.grudge_berserk {
            return;
        }
        let grudge_death = ctx
            .night_deaths
            .iter()
            .any(|d| self.player(d.target).map_or(false, |p| p.role == Role::GrudgeBeast));
        if grudge_death {
            self.grudge_berserk = true;
            self.log_public("Grudge Beasts entered berserk rage.");
        }
    }

    /// Stage 11 (part): every living necromancer gains one soul per death
    /// tonight that was not of their own making.
    fn award_necromancer_souls(&mut self, ctx: &NightContext) {
        for idx in 0..self.players.len() {
            if !self.players[idx].alive || self.players[idx].role != Role::Necromancer {
                continue;
            }
            let gained = ctx
                .night_deaths
                .iter()
                .filter(|d| d.killer != Some(idx))
                .count() as u32;
            self.players[idx].souls += gained;
        }
    }
}
