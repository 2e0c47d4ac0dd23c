use crate::battle::engine::Battle;
use crate::battle::state::{BattleState, CombatantRef};
use crate::battle::triggers::{self, SpeedContext, TriggerEvent, TriggerPayload};
use crate::errors::BattleResult;
use crate::pokemon::{Combatant, ATK, DEF, SPE, SP_ATK, SP_DEF};
use schema::{MoveCategory, StatType, StatusType};

/// Effective attacking stat for a move category, with stages applied.
pub fn effective_attack(combatant: &Combatant, category: MoveCategory) -> u16 {
    let (base, stat) = match category {
        MoveCategory::Physical => (combatant.stats[ATK], StatType::Atk),
        MoveCategory::Special => (combatant.stats[SP_ATK], StatType::SpAtk),
        MoveCategory::Status => return 0,
    };
    apply_stat_stage_multiplier(base, combatant.stat_stage(stat))
}

/// Effective defending stat for a move category, with stages applied.
pub fn effective_defense(combatant: &Combatant, category: MoveCategory) -> u16 {
    let (base, stat) = match category {
        MoveCategory::Physical => (combatant.stats[DEF], StatType::Def),
        MoveCategory::Special => (combatant.stats[SP_DEF], StatType::SpDef),
        MoveCategory::Status => return 0,
    };
    apply_stat_stage_multiplier(base, combatant.stat_stage(stat)).max(1)
}

/// Speed after stages and paralysis, before any trigger multipliers.
pub fn base_speed(combatant: &Combatant) -> u32 {
    let mut speed = u32::from(apply_stat_stage_multiplier(
        combatant.stats[SPE],
        combatant.stat_stage(StatType::Spe),
    ));
    if combatant.has_status(StatusType::Paralysis) {
        speed /= 2;
    }
    speed
}

/// Speed without consulting the trigger bus. Used to order the speed listeners themselves.
pub fn untriggered_speed(state: &BattleState, combatant: CombatantRef) -> u32 {
    state.combatant(combatant).map(base_speed).unwrap_or(0)
}

/// Full effective speed: stages, paralysis, then every `ModifySpeed` listener.
pub fn effective_speed(battle: &mut Battle, combatant: CombatantRef) -> BattleResult<u32> {
    let base = base_speed(battle.state.combatant(combatant)?);
    let publication = triggers::publish(
        battle,
        TriggerEvent::ModifySpeed,
        &TriggerPayload::Speed(SpeedContext { combatant }),
    );
    Ok((f64::from(base) * publication.multiplier()).floor() as u32)
}

/// Rolls accuracy for one target. Moves without an accuracy value never miss.
pub fn move_hits(
    battle: &mut Battle,
    user: CombatantRef,
    target: CombatantRef,
    accuracy: Option<u8>,
) -> BattleResult<bool> {
    let Some(base_accuracy) = accuracy else {
        return Ok(true);
    };
    let accuracy_stage = battle.state.combatant(user)?.stat_stage(StatType::Acc);
    let evasion_stage = battle.state.combatant(target)?.stat_stage(StatType::Eva);
    let adjusted_stage = (accuracy_stage - evasion_stage).clamp(-6, 6);

    let threshold = (f64::from(base_accuracy) * accuracy_stage_multiplier(adjusted_stage)).round();
    let threshold = threshold.clamp(1.0, 100.0) as u32;
    Ok(battle.rng.range(0, 100, "accuracy") < threshold)
}

/// Accuracy and evasion use thirds rather than halves.
pub fn accuracy_stage_multiplier(stage: i8) -> f64 {
    let stage = f64::from(stage.clamp(-6, 6));
    if stage >= 0.0 {
        (3.0 + stage) / 3.0
    } else {
        3.0 / (3.0 - stage)
    }
}

/// Negative stages: 2 / (2 + |stage|). Positive stages: (2 + stage) / 2.
pub fn apply_stat_stage_multiplier(base_stat: u16, stage: i8) -> u16 {
    let clamped_stage = stage.clamp(-6, 6);
    if clamped_stage == 0 {
        return base_stat;
    }
    let multiplier = if clamped_stage < 0 {
        2.0 / (2.0 + f64::from(-clamped_stage))
    } else {
        (2.0 + f64::from(clamped_stage)) / 2.0
    };
    (f64::from(base_stat) * multiplier).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::Dex;
    use schema::{Move, Species};
    use crate::pokemon::StatusCondition;
    use rstest::rstest;

    #[rstest]
    #[case(0, 100)]
    #[case(1, 150)]
    #[case(2, 200)]
    #[case(-1, 67)]
    #[case(-2, 50)]
    #[case(6, 400)]
    #[case(-6, 25)]
    fn test_stat_stage_multipliers(#[case] stage: i8, #[case] expected: u16) {
        assert_eq!(apply_stat_stage_multiplier(100, stage), expected);
    }

    #[test]
    fn test_accuracy_stage_multipliers() {
        assert!((accuracy_stage_multiplier(0) - 1.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(1) - 4.0 / 3.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(-1) - 3.0 / 4.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(6) - 3.0).abs() < 0.001);
        assert!((accuracy_stage_multiplier(-6) - 1.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn test_paralysis_halves_speed() {
        let dex = Dex::builtin().unwrap();
        let species = dex.species(Species::Pikachu).unwrap();
        let tackle = dex.move_data(Move::Tackle).unwrap();
        let mut pikachu = Combatant::new(species, 50, &[tackle]);
        assert_eq!(base_speed(&pikachu), 95);

        pikachu.status = Some(StatusCondition::new(StatusType::Paralysis));
        assert_eq!(base_speed(&pikachu), 47);

        pikachu.modify_stat_stage(StatType::Spe, 2);
        assert_eq!(base_speed(&pikachu), 95);
    }
}
