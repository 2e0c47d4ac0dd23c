use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Status => write!(f, "Status"),
        }
    }
}

/// Stats that can carry a battle stage. HP never does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
pub enum StatType {
    Atk,
    Def,
    SpAtk,
    SpDef,
    Spe,
    Acc,
    Eva,
}

impl StatType {
    pub const STAGE_COUNT: usize = 7;

    /// Index into a combatant's stage array.
    pub const fn stage_index(self) -> usize {
        match self {
            StatType::Atk => 0,
            StatType::Def => 1,
            StatType::SpAtk => 2,
            StatType::SpDef => 3,
            StatType::Spe => 4,
            StatType::Acc => 5,
            StatType::Eva => 6,
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatType::Atk => write!(f, "Attack"),
            StatType::Def => write!(f, "Defense"),
            StatType::SpAtk => write!(f, "Special Attack"),
            StatType::SpDef => write!(f, "Special Defense"),
            StatType::Spe => write!(f, "Speed"),
            StatType::Acc => write!(f, "Accuracy"),
            StatType::Eva => write!(f, "Evasion"),
        }
    }
}

/// Who a secondary effect lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    User,
    Target,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::User => write!(f, "User"),
            Target::Target => write!(f, "Target"),
        }
    }
}

/// Which field positions a move may be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTarget {
    /// The user itself; no selection.
    User,
    /// One opposing position, chosen at command time.
    SingleOpponent,
    /// Every opposing combatant on the field.
    AllOpponents,
    /// Every other combatant on the field, allies included.
    AllOthers,
}

impl MoveTarget {
    pub fn is_spread(self) -> bool {
        matches!(self, MoveTarget::AllOpponents | MoveTarget::AllOthers)
    }
}

/// Non-volatile status conditions. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusType {
    Sleep,
    Poison,
    Toxic,
    Burn,
    Freeze,
    Paralysis,
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusType::Sleep => write!(f, "asleep"),
            StatusType::Poison => write!(f, "poisoned"),
            StatusType::Toxic => write!(f, "badly poisoned"),
            StatusType::Burn => write!(f, "burned"),
            StatusType::Freeze => write!(f, "frozen"),
            StatusType::Paralysis => write!(f, "paralyzed"),
        }
    }
}
