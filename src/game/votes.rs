use super::action::VoteInputs;
use super::night::{majority_target, plurality_target};
use super::roles::{DeathCause, Phase, Role};
use super::Game;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recorded vote: who voted for whom.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct CastVote {
    pub actor: usize,
    pub target: usize,
}

/// The retained record of one day's vote. The order, flips, mention counts
/// and final tally all feed the AI suspicion model next round.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct VoteRound {
    pub day: u32,
    pub order: Vec<CastVote>,
    pub flips: Vec<usize>,
    pub mentions: BTreeMap<usize, usize>,
    pub tally: BTreeMap<usize, usize>,
}

impl Game {
    /// Resolves the day's execution vote.
    ///
    /// The threshold is a strict majority of living players; an unmet
    /// threshold falls back to the highest raw count (ties toward the lower
    /// id), and an empty tally executes nobody. Victory is re-evaluated
    /// afterward; if the game continues, the day counter increments and the
    /// next night begins.
    pub fn resolve_vote(
        &mut self,
        primary_target: Option<usize>,
        primary_last_words: &str,
        inputs: &VoteInputs,
    ) {
        if self.victory.is_some() {
            return;
        }
        self.phase = Phase::Vote;

        let alive_count = self.num_alive();
        let needed = alive_count / 2 + 1;

        let mut mentions: BTreeMap<usize, usize> = BTreeMap::new();
        for line in &self.day_chat {
            for p in &self.players {
                if line.contains(&p.name) {
                    *mentions.entry(p.id).or_default() += 1;
                }
            }
        }

        let mut tally: BTreeMap<usize, usize> = BTreeMap::new();
        let mut pairs: Vec<String> = vec![];
        let mut order: Vec<CastVote> = vec![];

        let mut human_votes: Vec<(usize, usize)> = vec![];
        if let Some(target_id) = primary_target {
            if let Some(human) = self.human() {
                if human.alive {
                    human_votes.push((human.id, target_id));
                }
            }
        }
        for (&actor_id, &target_id) in &inputs.human_votes {
            human_votes.push((actor_id, target_id));
        }
        for (actor_id, target_id) in human_votes {
            *tally.entry(target_id).or_default() += 1;
            if let (Some(actor), Some(target)) = (self.player(actor_id), self.player(target_id)) {
                pairs.push(format!("{} -> {}", actor.name, target.name));
                order.push(CastVote { actor: actor_id, target: target_id });
            }
        }

        for (actor_id, target_id) in self.build_ai_votes(None, inputs.include_human) {
            *tally.entry(target_id).or_default() += 1;
            if let (Some(actor), Some(target)) = (self.player(actor_id), self.player(target_id)) {
                pairs.push(format!("{} -> {}", actor.name, target.name));
                order.push(CastVote { actor: actor_id, target: target_id });
            }
        }

        // Flip-floppers: anyone whose vote moved since the previous day.
        let mut flips: Vec<usize> = vec![];
        let mut new_last: BTreeMap<usize, usize> = BTreeMap::new();
        for v in &order {
            if let Some(&prev) = self.last_vote_target_by_actor.get(&v.actor) {
                if prev != v.target {
                    flips.push(v.actor);
                }
            }
            new_last.insert(v.actor, v.target);
        }
        self.last_vote_target_by_actor = new_last;
        self.vote_history.push(VoteRound {
            day: self.day_number,
            order,
            flips,
            mentions,
            tally: tally.clone(),
        });

        if !pairs.is_empty() {
            let listing: Vec<String> = pairs.iter().map(|p| format!("- {}", p)).collect();
            self.log_public(format!("Votes:\n{}", listing.join("\n")));
        }

        let mut plurality = false;
        let mut result = majority_target(&tally, needed);
        if result.is_none() && !tally.is_empty() {
            result = plurality_target(&tally);
            plurality = result.is_some();
        }

        if let Some(target_id) = result {
            if self.player(target_id).map_or(false, |p| p.alive) {
                let count = tally.get(&target_id).copied().unwrap_or(0);
                self.mark_death(target_id, DeathCause::VoteExecution);
                let name = self.players[target_id].name.clone();
                if plurality {
                    self.log_public(format!("{} was executed by highest votes ({}).", name, count));
                } else {
                    self.log_public(format!(
                        "{} was executed by vote ({}/{}).",
                        name, count, alive_count
                    ));
                }

                let is_unrevived_brat = self.players[target_id].role == Role::Brat
                    && !self.players[target_id].status.brat_revived;
                if is_unrevived_brat {
                    // One-time revival; the brat stays revealed and loses
                    // their vote for the rest of the game.
                    self.revive(target_id);
                    self.players[target_id].status.brat_revived = true;
                    self.players[target_id].status.brat_revealed = true;
                    self.log_public(format!(
                        "{} revealed as Brat and revived (loses voting power).",
                        name
                    ));
                } else if self.players[target_id].is_human {
                    let candidate = inputs
                        .last_words_by_player
                        .get(&target_id)
                        .map(|s| s.as_str())
                        .unwrap_or(primary_last_words);
                    let trimmed = candidate.trim();
                    if !trimmed.is_empty()
                        && self.players[target_id].death_cause != Some(DeathCause::TerrorBomb)
                    {
                        let words: String = trimmed.chars().take(64).collect();
                        self.players[target_id].last_words = words.clone();
                        self.log_public(format!("Last words: \"{}\"", words));
                    }
                }
            }
        } else {
            self.log_public("No majority reached. Nobody was executed.");
        }

        self.update_winrate_hint();
        if self.check_victory().is_some() {
            self.phase = Phase::End;
        } else {
            self.phase = Phase::Night;
            self.day_number += 1;
        }
    }
}
