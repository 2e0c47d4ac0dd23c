use crate::battle_data::WeatherKind;
use crate::move_types::{MoveCategory, MoveTarget, StatType, StatusType, Target};
use crate::pokemon_types::PokemonType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Move {
    // Plain damage
    Tackle,
    Scratch,
    QuickAttack,
    Ember,
    Flamethrower,
    WaterGun,
    Surf,
    ThunderShock,
    Thunderbolt,
    VineWhip,
    IceBeam,
    Psychic,
    Earthquake,
    Bite,
    // Multi-strike
    DoubleKick,
    FurySwipes,
    // Fixed damage
    DragonRage,
    SeismicToss,
    // Recoil / sacrificial / reactive
    DoubleEdge,
    SelfDestruct,
    Counter,
    GigaDrain,
    PoisonSting,
    // Delayed, slot-bound
    FutureSight,
    Wish,
    // Status and stat changes
    ThunderWave,
    Toxic,
    Hypnosis,
    SwordsDance,
    Growl,
    Splash,
    // Switching
    Teleport,
    UTurn,
    // Field
    SunnyDay,
    RainDance,
    Sandstorm,
    Hail,
    Spikes,
    Tailwind,
    Metronome,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::QuickAttack => "Quick Attack",
            Move::WaterGun => "Water Gun",
            Move::ThunderShock => "Thunder Shock",
            Move::VineWhip => "Vine Whip",
            Move::IceBeam => "Ice Beam",
            Move::DoubleKick => "Double Kick",
            Move::FurySwipes => "Fury Swipes",
            Move::DragonRage => "Dragon Rage",
            Move::SeismicToss => "Seismic Toss",
            Move::DoubleEdge => "Double-Edge",
            Move::SelfDestruct => "Self-Destruct",
            Move::GigaDrain => "Giga Drain",
            Move::PoisonSting => "Poison Sting",
            Move::FutureSight => "Future Sight",
            Move::ThunderWave => "Thunder Wave",
            Move::SwordsDance => "Swords Dance",
            Move::UTurn => "U-turn",
            Move::SunnyDay => "Sunny Day",
            Move::RainDance => "Rain Dance",
            other => return write!(f, "{:?}", other),
        };
        write!(f, "{}", name)
    }
}

/// How many strikes a multi-hit move declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitCount {
    Fixed(u8),
    /// 2-5 strikes with the 35/35/15/15 distribution.
    Random,
}

/// A composable effect descriptor carried by a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveEffect {
    // Per-hit secondaries
    Status { status: StatusType, chance: u8 },
    StatChange { target: Target, stat: StatType, stages: i8, chance: u8 },
    Drain(u8), // % of damage dealt

    // Hit count and damage shape
    MultiHit(HitCount),
    FixedDamage(u16),
    LevelDamage,
    HighCrit,
    Counter, // returns double the physical damage taken this turn

    // Once per use, after every strike
    Recoil(u8), // % of total damage dealt
    Sacrificial,
    SelfSwitch,

    // Slot-bound delayed effects
    DelayedAttack { turns: u8 },
    DelayedHeal { turns: u8, percent: u8 },

    // Field
    SetWeather(WeatherKind),
    Spikes,
    Tailwind { turns: u8 },

    /// A descriptor the engine has no handler for. Logged and skipped.
    Unimplemented(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
    pub id: Move,
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub power: Option<u16>,
    pub accuracy: Option<u8>, // None = never misses
    pub max_pp: u8,
    #[serde(default)]
    pub priority: i8,
    pub target: MoveTarget,
    #[serde(default)]
    pub effects: Vec<MoveEffect>,
}

impl MoveData {
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status
    }

    pub fn hit_count(&self) -> Option<HitCount> {
        self.effects.iter().find_map(|effect| match effect {
            MoveEffect::MultiHit(count) => Some(*count),
            _ => None,
        })
    }

    pub fn is_fixed_damage(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, MoveEffect::FixedDamage(_) | MoveEffect::LevelDamage))
    }

    pub fn is_counter(&self) -> bool {
        self.effects.contains(&MoveEffect::Counter)
    }

    pub fn has_self_cost(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, MoveEffect::Recoil(_) | MoveEffect::Sacrificial))
    }

    pub fn is_delayed(&self) -> bool {
        self.effects.iter().any(|e| {
            matches!(
                e,
                MoveEffect::DelayedAttack { .. } | MoveEffect::DelayedHeal { .. }
            )
        })
    }

    /// Whether abilities or held items may add strikes to this move.
    ///
    /// Multi-hit, fixed-damage, recoil/self-KO and counter-style moves never
    /// receive extra strikes, nor do status moves or moves hitting several targets.
    pub fn accepts_extra_strikes(&self) -> bool {
        self.is_damaging()
            && !self.target.is_spread()
            && self.hit_count().is_none()
            && !self.is_fixed_damage()
            && !self.has_self_cost()
            && !self.is_counter()
            && !self.is_delayed()
    }

    pub fn has_high_crit(&self) -> bool {
        self.effects.contains(&MoveEffect::HighCrit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damaging(effects: Vec<MoveEffect>, target: MoveTarget) -> MoveData {
        MoveData {
            id: Move::Tackle,
            name: "Test".to_string(),
            move_type: PokemonType::Normal,
            category: MoveCategory::Physical,
            power: Some(40),
            accuracy: Some(100),
            max_pp: 35,
            priority: 0,
            target,
            effects,
        }
    }

    #[test]
    fn test_extra_strike_eligibility() {
        assert!(damaging(vec![], MoveTarget::SingleOpponent).accepts_extra_strikes());
        assert!(!damaging(vec![], MoveTarget::AllOpponents).accepts_extra_strikes());
        for exempt in [
            MoveEffect::MultiHit(HitCount::Fixed(2)),
            MoveEffect::MultiHit(HitCount::Random),
            MoveEffect::FixedDamage(40),
            MoveEffect::LevelDamage,
            MoveEffect::Recoil(33),
            MoveEffect::Sacrificial,
            MoveEffect::Counter,
        ] {
            let data = damaging(vec![exempt.clone()], MoveTarget::SingleOpponent);
            assert!(!data.accepts_extra_strikes(), "{:?} must be exempt", exempt);
        }
    }
}
