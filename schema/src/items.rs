use serde::{Deserialize, Serialize};
use std::fmt;

/// Items a combatant can hold. Each becomes a stackable modifier in battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeldItem {
    Leftovers,
    ChoiceBand,
    MultiLens,
    SitrusBerry,
}

impl fmt::Display for HeldItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeldItem::Leftovers => write!(f, "Leftovers"),
            HeldItem::ChoiceBand => write!(f, "Choice Band"),
            HeldItem::MultiLens => write!(f, "Multi Lens"),
            HeldItem::SitrusBerry => write!(f, "Sitrus Berry"),
        }
    }
}

/// Items used from the bag as a turn action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BagItem {
    Potion,
    SuperPotion,
    FullHeal,
}

impl BagItem {
    pub fn heal_amount(self) -> Option<u16> {
        match self {
            BagItem::Potion => Some(20),
            BagItem::SuperPotion => Some(60),
            BagItem::FullHeal => None,
        }
    }

    pub fn cures_status(self) -> bool {
        matches!(self, BagItem::FullHeal)
    }
}

impl fmt::Display for BagItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BagItem::Potion => write!(f, "Potion"),
            BagItem::SuperPotion => write!(f, "Super Potion"),
            BagItem::FullHeal => write!(f, "Full Heal"),
        }
    }
}

/// Capture tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pokeball {
    PokeBall,
    GreatBall,
    UltraBall,
    RogueBall,
    MasterBall,
}

impl Pokeball {
    pub fn multiplier(self) -> f64 {
        match self {
            Pokeball::PokeBall => 1.0,
            Pokeball::GreatBall => 1.5,
            Pokeball::UltraBall => 2.0,
            Pokeball::RogueBall => 3.0,
            Pokeball::MasterBall => 1.0,
        }
    }

    /// A guaranteed tool skips every random check.
    pub fn is_guaranteed(self) -> bool {
        matches!(self, Pokeball::MasterBall)
    }
}

impl fmt::Display for Pokeball {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pokeball::PokeBall => write!(f, "Poké Ball"),
            Pokeball::GreatBall => write!(f, "Great Ball"),
            Pokeball::UltraBall => write!(f, "Ultra Ball"),
            Pokeball::RogueBall => write!(f, "Rogue Ball"),
            Pokeball::MasterBall => write!(f, "Master Ball"),
        }
    }
}
