use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    NoAbility,
    ParentalBond,
    Intimidate,
    SpeedBoost,
    NeutralizingGas,
    Levitate,
    HugePower,
    Drought,
    Unburden,
    Moxie,
    Defiant,
}

impl AbilityId {
    /// Abilities that keep working while abilities are globally suppressed.
    pub fn ignores_suppression(self) -> bool {
        matches!(self, AbilityId::NeutralizingGas)
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AbilityId::NoAbility => "No Ability",
            AbilityId::ParentalBond => "Parental Bond",
            AbilityId::SpeedBoost => "Speed Boost",
            AbilityId::NeutralizingGas => "Neutralizing Gas",
            AbilityId::HugePower => "Huge Power",
            other => return write!(f, "{:?}", other),
        };
        write!(f, "{}", name)
    }
}
