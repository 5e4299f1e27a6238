use serde::{Deserialize, Serialize};

/// The three win-condition groupings. Not always visible to other players.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Faction {
    Blue,
    Red,
    Green,
}

impl Faction {
    pub fn as_str(self) -> &'static str {
        match self {
            Faction::Blue => "BLUE",
            Faction::Red => "RED",
            Faction::Green => "GREEN",
        }
    }
}

/// The roles of the game. The serialized identifiers are part of the wire
/// protocol and must not change.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Police,
    Killer,
    Doctor,
    Sniper,
    Agent,
    Terrorist,
    Cowboy,
    Kidnapper,
    Zombie,
    RiotPolice,
    Arsonist,
    HeavenlyFiend,
    VineDemon,
    Brat,
    NightmareDemon,
    Exorcist,
    Necromancer,
    Purifier,
    GrudgeBeast,
    Civilian,
}

/// How many injections the doctor has for the whole game.
pub const MAX_DOCTOR_INJECTIONS: u32 = 4;
/// The second empty injection on the same target is fatal.
pub const EMPTY_INJECTIONS_FATAL_AT: u32 = 2;
pub const MAX_SNIPER_SHOTS: u32 = 4;
pub const MAX_RIOT_GRENADES: u32 = 4;
pub const MAX_EXORCIST_CHAINS: u32 = 3;
/// A second smoke stack on the same target in one night is fatal.
pub const SMOKE_FATAL_AT: u32 = 2;
pub const ZOMBIE_BITES_FATAL_AT: u32 = 3;
pub const ZOMBIE_BITES_CONVERT_AT: u32 = 2;

impl Role {
    pub fn faction(self) -> Faction {
        use Role::*;
        match self {
            Police | Doctor | Agent | Cowboy | RiotPolice | HeavenlyFiend | Brat | Exorcist
            | Purifier | Civilian => Faction::Blue,
            Killer | Sniper | Terrorist | Kidnapper | Arsonist | VineDemon | NightmareDemon
            | Necromancer => Faction::Red,
            Zombie | GrudgeBeast => Faction::Green,
        }
    }

    pub fn has_night_action(self) -> bool {
        !matches!(self, Role::Brat | Role::Civilian)
    }

    pub fn as_str(self) -> &'static str {
        use Role::*;
        match self {
            Police => "POLICE",
            Killer => "KILLER",
            Doctor => "DOCTOR",
            Sniper => "SNIPER",
            Agent => "AGENT",
            Terrorist => "TERRORIST",
            Cowboy => "COWBOY",
            Kidnapper => "KIDNAPPER",
            Zombie => "ZOMBIE",
            RiotPolice => "RIOT_POLICE",
            Arsonist => "ARSONIST",
            HeavenlyFiend => "HEAVENLY_FIEND",
            VineDemon => "VINE_DEMON",
            Brat => "BRAT",
            NightmareDemon => "NIGHTMARE_DEMON",
            Exorcist => "EXORCIST",
            Necromancer => "NECROMANCER",
            Purifier => "PURIFIER",
            GrudgeBeast => "GRUDGE_BEAST",
            Civilian => "CIVILIAN",
        }
    }
}

/// Represents the current phase in the game loop.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Night,
    Day,
    Vote,
    End,
}

/// Why a player died. Serialized identifiers are part of the wire protocol.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeathCause {
    KillerMurder,
    SniperHeadshot,
    EmptyInjection,
    VoteExecution,
    AgentLink,
    TerrorBomb,
    CowboyShot,
    CowboyBackfire,
    KidnapExecution,
    ZombieBite,
    ZombieFatal,
    SmokeOverdose,
    ArsonBurn,
    FiendShot,
    ExorcistPetrify,
    NecromancerCurse,
    VineSwap,
    NightmareStrike,
    GrudgePunish,
}

impl DeathCause {
    /// Kills with these causes pierce every protection.
    pub fn is_unblockable(self) -> bool {
        use DeathCause::*;
        matches!(
            self,
            SniperHeadshot | TerrorBomb | ArsonBurn | ZombieFatal | SmokeOverdose
        )
    }

    /// Whether the doctor's injection can cancel a pending kill of this cause.
    pub fn is_doctor_revivable(self) -> bool {
        use DeathCause::*;
        matches!(self, KillerMurder | KidnapExecution | ExorcistPetrify)
    }

    /// Human-readable cause, used in the public log.
    pub fn description(self) -> &'static str {
        use DeathCause::*;
        match self {
            KillerMurder => "murdered during the night",
            SniperHeadshot => "sniper headshot",
            EmptyInjection => "fatal overdose",
            VoteExecution => "executed by vote",
            TerrorBomb => "died in a bomb blast",
            ArsonBurn => "burned by arson",
            KidnapExecution => "executed by ransom",
            ZombieBite | ZombieFatal => "killed by infection",
            SmokeOverdose => "choked in smoke",
            AgentLink => "died with their agent",
            CowboyShot => "shot by a cowboy",
            CowboyBackfire => "cowboy backfire",
            ExorcistPetrify => "petrified by an exorcist",
            NecromancerCurse => "cursed by a necromancer",
            FiendShot => "smited by a heavenly fiend",
            NightmareStrike => "slain by nightmare demon",
            GrudgePunish => "cut down by grudge beasts",
            VineSwap => "sacrificed by vine seed",
        }
    }
}

/// How sharply the AI reacts to behavioral signals.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

impl Difficulty {
    pub fn suspicion_scale(self) -> f64 {
        match self {
            Difficulty::Easy => 0.6,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
            Difficulty::Nightmare => 1.6,
        }
    }

    /// Parses the client-supplied difficulty id, defaulting to normal.
    pub fn from_id(id: &str) -> Self {
        match id {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            "nightmare" => Difficulty::Nightmare,
            _ => Difficulty::Normal,
        }
    }
}
