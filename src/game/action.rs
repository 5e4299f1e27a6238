use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A once-per-night ability submission, one variant per role ability.
///
/// The serialized form (`{"type": "POLICE_INVESTIGATE", "targetId": 3}`)
/// is part of the wire protocol.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum NightAction {
    PoliceInvestigate { target_id: usize },
    KillerVote { target_id: usize },
    DoctorInject { target_id: usize },
    SniperShot { target_id: usize },
    AgentProtect { target_id: usize },
    FiendProtect { target_id: usize },
    FiendShoot { target_id: usize },
    TerrorBomb { target_id: usize },
    CowboyGamble { target_id: usize },
    Kidnap { target_id: usize },
    ZombieBite { target_id: usize },
    RiotSmoke { target_id: usize },
    ArsonMark { target_id: usize },
    ArsonIgnite,
    VineSeed { target_id: usize },
    NightmareAttack { target_id: usize },
    ExorcistStrike { target_id: usize },
    NecromancerCurse { target_id: usize },
    Purify { target_id: usize },
    GrudgeJudge { target_id: usize },
    GrudgeKillVote { target_id: usize },
}

impl NightAction {
    /// Control actions gate whether later actors can act or be targeted,
    /// and therefore resolve before everything else.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            NightAction::RiotSmoke { .. } | NightAction::Purify { .. } | NightAction::Kidnap { .. }
        )
    }

    pub fn target(self) -> Option<usize> {
        use NightAction::*;
        match self {
            PoliceInvestigate { target_id }
            | KillerVote { target_id }
            | DoctorInject { target_id }
            | SniperShot { target_id }
            | AgentProtect { target_id }
            | FiendProtect { target_id }
            | FiendShoot { target_id }
            | TerrorBomb { target_id }
            | CowboyGamble { target_id }
            | Kidnap { target_id }
            | ZombieBite { target_id }
            | RiotSmoke { target_id }
            | ArsonMark { target_id }
            | VineSeed { target_id }
            | NightmareAttack { target_id }
            | ExorcistStrike { target_id }
            | NecromancerCurse { target_id }
            | Purify { target_id }
            | GrudgeJudge { target_id }
            | GrudgeKillVote { target_id } => Some(target_id),
            ArsonIgnite => None,
        }
    }
}

/// An action paired with the player submitting it.
#[derive(Clone, Copy, Debug)]
pub struct SubmittedAction {
    pub actor_id: usize,
    pub action: NightAction,
}

/// Buffered human input for one night resolution.
///
/// One slot per actor, last write wins; the session layer owns the buffering.
/// `include_human` lets the AI also act for human seats (self-play).
#[derive(Clone, Debug, Default)]
pub struct NightInputs {
    pub human_actions: BTreeMap<usize, NightAction>,
    pub include_human: bool,
}

/// Buffered human input for one vote resolution.
#[derive(Clone, Debug, Default)]
pub struct VoteInputs {
    pub human_votes: BTreeMap<usize, usize>,
    pub last_words_by_player: BTreeMap<usize, String>,
    pub include_human: bool,
}
