use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherKind {
    Sun,
    Rain,
    Sandstorm,
    Hail,
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            WeatherKind::Sun => "harsh sunlight",
            WeatherKind::Rain => "rain",
            WeatherKind::Sandstorm => "sandstorm",
            WeatherKind::Hail => "hail",
        };
        write!(f, "{}", display_name)
    }
}

/// Battles are either fought by one combatant per side or two.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BattleFormat {
    #[default]
    Singles,
    Doubles,
}

impl BattleFormat {
    pub const fn slots(self) -> usize {
        match self {
            BattleFormat::Singles => 1,
            BattleFormat::Doubles => 2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BattleKind {
    #[default]
    Wild,
    Trainer,
}
