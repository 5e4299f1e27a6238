use super::roles::Role;
use serde::{Deserialize, Serialize};

/// A named preset mapping roles to seat counts for an 18-seat game.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    GoodVsEvil,
    CounterTerror,
    WildWest,
    DoomsdayHorror,
    StreetFury,
    PsychicCentury,
    OtherDimension,
    FinalJudgement,
}

impl Theme {
    pub fn name(self) -> &'static str {
        use Theme::*;
        match self {
            GoodVsEvil => "Good vs Evil (Standard 18)",
            CounterTerror => "Counter-Terror Crisis (18)",
            WildWest => "Wild West (18)",
            DoomsdayHorror => "Doomsday Horror (18)",
            StreetFury => "Street Fury (18)",
            PsychicCentury => "Psychic Century (18)",
            OtherDimension => "Other Dimension (18)",
            FinalJudgement => "Final Judgement (18)",
        }
    }

    pub fn role_counts(self) -> &'static [(Role, usize)] {
        use Role::*;
        use Theme::*;
        match self {
            GoodVsEvil => &[(Police, 4), (Killer, 4), (Doctor, 1), (Sniper, 1), (Civilian, 8)],
            CounterTerror => &[
                (Police, 4),
                (Killer, 4),
                (Doctor, 1),
                (Sniper, 1),
                (Agent, 1),
                (Terrorist, 1),
                (Civilian, 6),
            ],
            WildWest => &[
                (Police, 4),
                (Killer, 4),
                (Doctor, 1),
                (Sniper, 1),
                (Cowboy, 1),
                (Kidnapper, 1),
                (Civilian, 6),
            ],
            DoomsdayHorror => &[
                (Police, 4),
                (Killer, 4),
                (Doctor, 1),
                (Sniper, 1),
                (Cowboy, 1),
                (Kidnapper, 1),
                (Zombie, 1),
                (Civilian, 5),
            ],
            StreetFury => &[
                (Police, 4),
                (Killer, 4),
                (RiotPolice, 1),
                (Arsonist, 1),
                (Agent, 1),
                (Terrorist, 1),
                (Civilian, 6),
            ],
            PsychicCentury => &[
                (Police, 4),
                (Killer, 4),
                (Doctor, 1),
                (Sniper, 1),
                (HeavenlyFiend, 1),
                (VineDemon, 1),
                (Brat, 1),
                (Civilian, 5),
            ],
            OtherDimension => &[
                (Police, 4),
                (Killer, 4),
                (Exorcist, 1),
                (NightmareDemon, 1),
                (Purifier, 1),
                (Necromancer, 1),
                (Civilian, 6),
            ],
            FinalJudgement => &[
                (Police, 4),
                (Killer, 4),
                (GrudgeBeast, 3),
                (Cowboy, 1),
                (Sniper, 1),
                (Civilian, 5),
            ],
        }
    }

    /// The full 18-role pool for this theme, in preset order.
    pub fn role_pool(self) -> Vec<Role> {
        let mut pool = vec![];
        for &(role, count) in self.role_counts() {
            pool.extend(std::iter::repeat(role).take(count));
        }
        pool
    }

    /// Themes where wiping out every non-police, non-killer player is an
    /// outright red victory.
    pub fn civilian_wipe_auto_win(self) -> bool {
        matches!(self, Theme::GoodVsEvil | Theme::CounterTerror | Theme::WildWest)
    }

    /// Parses the client-supplied theme id, defaulting to the standard theme.
    pub fn from_id(id: &str) -> Self {
        use Theme::*;
        match id {
            "COUNTER_TERROR" => CounterTerror,
            "WILD_WEST" => WildWest,
            "DOOMSDAY_HORROR" => DoomsdayHorror,
            "STREET_FURY" => StreetFury,
            "PSYCHIC_CENTURY" => PsychicCentury,
            "OTHER_DIMENSION" => OtherDimension,
            "FINAL_JUDGEMENT" => FinalJudgement,
            _ => GoodVsEvil,
        }
    }
}
