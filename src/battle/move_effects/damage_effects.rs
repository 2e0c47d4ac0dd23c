use crate::battle::conditions;
use crate::battle::damage::{self, DamageInput};
use crate::battle::engine::Battle;
use crate::battle::phases::MoveEffectPhase;
use crate::battle::state::{BattleEvent, CombatantRef, DamageSource};
use crate::battle::stats;
use crate::battle::triggers::{self, TriggerEvent};
use crate::errors::BattleResult;
use schema::{MoveCategory, MoveData, MoveEffect, PokemonType, StatusType};
use tracing::trace;

use super::move_context;

/// Damage that ignores stats and multipliers, if the move deals any.
fn fixed_damage(battle: &Battle, user: CombatantRef, data: &MoveData) -> BattleResult<Option<u16>> {
    let attacker = battle.state.combatant(user)?;
    for effect in &data.effects {
        match effect {
            MoveEffect::FixedDamage(amount) => return Ok(Some(*amount)),
            MoveEffect::LevelDamage => return Ok(Some(u16::from(attacker.level))),
            MoveEffect::Counter => {
                return Ok(Some(attacker.volatile.physical_damage_taken.saturating_mul(2)));
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Rolls and applies one strike's damage to `target`. Returns the HP lost.
///
/// RNG draws happen in a fixed order: critical hit, then damage variance.
pub(super) fn apply_strike_damage(
    battle: &mut Battle,
    phase: &MoveEffectPhase,
    data: &MoveData,
    target: CombatantRef,
) -> BattleResult<u16> {
    let user = phase.user;
    let source = if phase.detached_user {
        DamageSource::DelayedAttack(data.id)
    } else {
        DamageSource::Move(data.id)
    };

    let amount = match fixed_damage(battle, user, data)? {
        Some(amount) => amount,
        None => {
            let Some(amount) = calculate_strike(battle, phase, data, target)? else {
                return Ok(0);
            };
            amount
        }
    };

    if phase.detached_user {
        battle.emit(BattleEvent::DelayedAttackLanded {
            target,
            move_used: data.id,
        });
    }
    let dealt = conditions::deal_damage(battle, target, amount, source, Some(user))?;
    if data.category == MoveCategory::Physical && user.side != target.side && dealt > 0 {
        let volatile = &mut battle.state.combatant_mut(target)?.volatile;
        volatile.physical_damage_taken = volatile.physical_damage_taken.saturating_add(dealt);
        volatile.last_physical_attacker = Some(user);
    }
    Ok(dealt)
}

fn calculate_strike(
    battle: &mut Battle,
    phase: &MoveEffectPhase,
    data: &MoveData,
    target: CombatantRef,
) -> BattleResult<Option<u16>> {
    let user = phase.user;
    let attacker = battle.state.combatant(user)?;
    let defender = battle.state.combatant(target)?;
    let effectiveness = PokemonType::effectiveness_against(data.move_type, &defender.types);
    let level = attacker.level;
    let attack = stats::effective_attack(attacker, data.category);
    let defense = stats::effective_defense(defender, data.category);
    let stab = attacker.has_type(data.move_type);
    let burned = attacker.has_status(StatusType::Burn) && data.category == MoveCategory::Physical;

    let denominator = if data.has_high_crit() {
        battle.config.high_critical_denominator
    } else {
        battle.config.critical_denominator
    };
    let critical = battle.rng.one_in(1, denominator, "critical hit");
    let ability_item = triggers::publish(
        battle,
        TriggerEvent::ModifyDamage,
        &move_context(user, Some(target), data),
    )
    .multiplier();
    let variance = battle.rng.range(85, 101, "damage variance") as u8;

    let extra_strike =
        phase.extra_strikes > 0 && phase.strike >= phase.total_strikes - phase.extra_strikes;
    let input = DamageInput {
        level,
        power: data.power.unwrap_or(0),
        extra_strike,
        attack,
        defense,
        stab,
        effectiveness: f64::from(effectiveness),
        weather: damage::weather_multiplier(battle.state.arena.weather_kind(), data.move_type),
        ability_item,
        burned,
        variance,
        critical,
    };
    let amount = damage::calculate_damage(&input);
    trace!(?input, amount, "strike damage");
    if amount == 0 {
        return Ok(None);
    }

    if critical {
        battle.emit(BattleEvent::CriticalHit { target });
    }
    if phase.strike == 0 && effectiveness != 1.0 {
        battle.emit(BattleEvent::Effectiveness {
            target,
            multiplier: effectiveness,
        });
    }
    Ok(Some(amount))
}

pub(super) fn apply_drain(
    battle: &mut Battle,
    user: CombatantRef,
    dealt: u16,
    percent: u8,
) -> BattleResult<()> {
    if dealt == 0 || !battle.state.is_active(user) {
        return Ok(());
    }
    let amount = (u32::from(dealt) * u32::from(percent) / 100).max(1) as u16;
    conditions::heal(battle, user, amount)?;
    Ok(())
}

pub(super) fn apply_recoil(
    battle: &mut Battle,
    user: CombatantRef,
    total_damage: u32,
    percent: u8,
) -> BattleResult<()> {
    if total_damage == 0 {
        return Ok(());
    }
    let amount = (total_damage * u32::from(percent) / 100).clamp(1, u32::from(u16::MAX)) as u16;
    conditions::deal_damage(battle, user, amount, DamageSource::Recoil, None)?;
    Ok(())
}

/// The user faints after its move, whatever the move did.
pub(super) fn apply_self_knockout(battle: &mut Battle, user: CombatantRef) -> BattleResult<()> {
    let hp = battle.state.combatant(user)?.current_hp();
    if hp > 0 {
        conditions::deal_damage(battle, user, hp, DamageSource::SelfKnockout, None)?;
    }
    Ok(())
}
