//! Damage calculation.
//!
//! Pure: callers gather every input (rolls included) and apply the result.

use schema::{PokemonType, WeatherKind};

pub const STAB_MULTIPLIER: f64 = 1.5;
pub const CRITICAL_MULTIPLIER: f64 = 1.5;
pub const EXTRA_STRIKE_POWER: f64 = 0.25;
pub const BURN_MULTIPLIER: f64 = 0.5;

/// Everything that feeds one strike's damage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    pub level: u8,
    pub power: u16,
    /// Strikes granted by abilities or items hit at reduced power.
    pub extra_strike: bool,
    pub attack: u16,
    pub defense: u16,
    pub stab: bool,
    pub effectiveness: f64,
    pub weather: f64,
    /// Folded `ModifyDamage` multiplier.
    pub ability_item: f64,
    /// Burned user on a physical move.
    pub burned: bool,
    /// 85..=100
    pub variance: u8,
    pub critical: bool,
}

/// Calculate the damage of one strike.
///
/// # Formula
///
/// ```text
/// power  = base_power (x0.25 for an extra strike)
/// damage = (2*level/5 + 2) * power * attack/defense / 50 + 2
/// damage *= stab * effectiveness
/// damage *= weather
/// damage *= ability/item multipliers * burn
/// damage *= variance / 100
/// damage *= critical
/// result = max(1, floor(damage))
/// ```
///
/// Every multiplier is applied in that order to an unrounded value, and the
/// result is floored once. An effectiveness of zero is an immunity and deals
/// nothing.
pub fn calculate_damage(input: &DamageInput) -> u16 {
    if input.effectiveness <= 0.0 || input.power == 0 {
        return 0;
    }

    let mut power = f64::from(input.power);
    if input.extra_strike {
        power *= EXTRA_STRIKE_POWER;
    }

    let level_factor = 2.0 * f64::from(input.level) / 5.0 + 2.0;
    let ratio = f64::from(input.attack) / f64::from(input.defense.max(1));
    let mut damage = level_factor * power * ratio / 50.0 + 2.0;

    if input.stab {
        damage *= STAB_MULTIPLIER;
    }
    damage *= input.effectiveness;
    damage *= input.weather;
    damage *= input.ability_item;
    if input.burned {
        damage *= BURN_MULTIPLIER;
    }
    damage *= f64::from(input.variance) / 100.0;
    if input.critical {
        damage *= CRITICAL_MULTIPLIER;
    }

    let floored = damage.floor().clamp(1.0, f64::from(u16::MAX));
    floored as u16
}

/// Power multiplier weather gives a move type.
pub fn weather_multiplier(weather: Option<WeatherKind>, move_type: PokemonType) -> f64 {
    match (weather, move_type) {
        (Some(WeatherKind::Sun), PokemonType::Fire) => 1.5,
        (Some(WeatherKind::Sun), PokemonType::Water) => 0.5,
        (Some(WeatherKind::Rain), PokemonType::Water) => 1.5,
        (Some(WeatherKind::Rain), PokemonType::Fire) => 0.5,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn neutral() -> DamageInput {
        DamageInput {
            level: 50,
            power: 40,
            extra_strike: false,
            attack: 100,
            defense: 100,
            stab: false,
            effectiveness: 1.0,
            weather: 1.0,
            ability_item: 1.0,
            burned: false,
            variance: 100,
            critical: false,
        }
    }

    #[test]
    fn test_neutral_hit() {
        // 22 * 40 / 50 + 2 = 19.6
        assert_eq!(calculate_damage(&neutral()), 19);
    }

    #[test]
    fn test_result_is_floored_once() {
        // 19.6 * 1.5 = 29.4; flooring before STAB would give 28.
        let input = DamageInput {
            stab: true,
            ..neutral()
        };
        assert_eq!(calculate_damage(&input), 29);
    }

    #[rstest]
    #[case::variance(DamageInput { stab: true, variance: 85, ..neutral() }, 24)]
    #[case::critical(DamageInput { stab: true, critical: true, ..neutral() }, 44)]
    #[case::extra_strike(DamageInput { stab: true, extra_strike: true, ..neutral() }, 9)]
    #[case::burned(DamageInput { burned: true, ..neutral() }, 9)]
    #[case::super_effective(DamageInput { effectiveness: 2.0, ..neutral() }, 39)]
    fn test_multipliers(#[case] input: DamageInput, #[case] expected: u16) {
        assert_eq!(calculate_damage(&input), expected);
    }

    #[test]
    fn test_immunity_deals_nothing_and_minimum_is_one() {
        let immune = DamageInput {
            effectiveness: 0.0,
            ..neutral()
        };
        assert_eq!(calculate_damage(&immune), 0);

        let feeble = DamageInput {
            level: 1,
            power: 10,
            attack: 5,
            defense: 300,
            effectiveness: 0.25,
            variance: 85,
            ..neutral()
        };
        assert_eq!(calculate_damage(&feeble), 1);
    }

    #[test]
    fn test_weather_multipliers() {
        assert_eq!(weather_multiplier(Some(WeatherKind::Sun), PokemonType::Fire), 1.5);
        assert_eq!(weather_multiplier(Some(WeatherKind::Rain), PokemonType::Fire), 0.5);
        assert_eq!(weather_multiplier(Some(WeatherKind::Hail), PokemonType::Fire), 1.0);
        assert_eq!(weather_multiplier(None, PokemonType::Water), 1.0);
    }
}
