// HP, status and weather mutations shared by every phase handler.
//
// All HP changes go through here so the clamp, the damage event, the
// damage-taken trigger and the faint check happen the same way everywhere.

use crate::battle::engine::Battle;
use crate::battle::phases::{FaintPhase, Phase};
use crate::battle::state::{BattleEvent, CombatantRef, DamageSource, MoveFailureReason, Weather};
use crate::battle::triggers::{self, DamageContext, TriggerEvent, TriggerPayload};
use crate::errors::BattleResult;
use crate::pokemon::{Combatant, StatusCondition};
use schema::{PokemonType, StatusType, WeatherKind};
use tracing::debug;

/// Applies damage and handles the consequences. Returns the HP actually lost.
pub(crate) fn deal_damage(
    battle: &mut Battle,
    target: CombatantRef,
    amount: u16,
    source: DamageSource,
    attacker: Option<CombatantRef>,
) -> BattleResult<u16> {
    let combatant = battle.state.combatant_mut(target)?;
    let dealt = combatant.take_damage(amount);
    let remaining_hp = combatant.current_hp();
    battle.emit(BattleEvent::DamageDealt {
        target,
        amount: dealt,
        remaining_hp,
        source,
    });

    if remaining_hp == 0 {
        queue_faint(battle, target, attacker);
    } else if dealt > 0 {
        triggers::publish(
            battle,
            TriggerEvent::DamageTaken,
            &TriggerPayload::Damage(DamageContext {
                target,
                source: attacker,
                amount: dealt,
            }),
        );
    }
    Ok(dealt)
}

/// Queues a faint phase for `target` unless one is already pending.
pub(crate) fn queue_faint(battle: &mut Battle, target: CombatantRef, source: Option<CombatantRef>) {
    let pending = battle
        .queue
        .pending()
        .any(|phase| matches!(phase, Phase::Faint(f) if f.combatant == target));
    if !pending {
        battle.queue.unshift(Phase::Faint(FaintPhase {
            combatant: target,
            source,
        }));
    }
}

/// Restores HP, clamped. Returns the amount restored.
pub(crate) fn heal(battle: &mut Battle, target: CombatantRef, amount: u16) -> BattleResult<u16> {
    let combatant = battle.state.combatant_mut(target)?;
    if combatant.is_fainted() {
        return Ok(0);
    }
    let restored = combatant.heal(amount);
    let new_hp = combatant.current_hp();
    if restored > 0 {
        battle.emit(BattleEvent::Healed {
            target,
            amount: restored,
            new_hp,
        });
    }
    Ok(restored)
}

/// Types that can never carry a given status.
pub fn status_immune(combatant: &Combatant, status: StatusType) -> bool {
    match status {
        StatusType::Burn => combatant.has_type(PokemonType::Fire),
        StatusType::Freeze => combatant.has_type(PokemonType::Ice),
        StatusType::Paralysis => combatant.has_type(PokemonType::Electric),
        StatusType::Poison | StatusType::Toxic => {
            combatant.has_type(PokemonType::Poison) || combatant.has_type(PokemonType::Steel)
        }
        StatusType::Sleep => false,
    }
}

/// Tries to inflict a status. Returns whether it took hold.
pub(crate) fn apply_status(
    battle: &mut Battle,
    target: CombatantRef,
    status: StatusType,
) -> BattleResult<bool> {
    let combatant = battle.state.combatant(target)?;
    if combatant.is_fainted() || combatant.status.is_some() || status_immune(combatant, status) {
        return Ok(false);
    }
    let condition = match status {
        StatusType::Sleep => StatusCondition::sleep(battle.rng.range(2, 5, "sleep duration") as u8),
        other => StatusCondition::new(other),
    };
    battle.state.combatant_mut(target)?.status = Some(condition);
    battle.emit(BattleEvent::StatusApplied { target, status });
    Ok(true)
}

pub(crate) fn cure_status(battle: &mut Battle, target: CombatantRef) -> BattleResult<bool> {
    let combatant = battle.state.combatant_mut(target)?;
    let Some(previous) = combatant.status.take() else {
        return Ok(false);
    };
    battle.emit(BattleEvent::StatusCured {
        target,
        status: previous.kind,
    });
    Ok(true)
}

/// Status checks made as a combatant tries to move.
///
/// Returns the reason the move is prevented, if it is.
pub(crate) fn status_prevents_move(
    battle: &mut Battle,
    user: CombatantRef,
) -> BattleResult<Option<MoveFailureReason>> {
    let Some(status) = battle.state.combatant(user)?.status else {
        return Ok(None);
    };
    match status.kind {
        StatusType::Sleep => {
            let remaining = status.counter.saturating_sub(1);
            if remaining == 0 {
                cure_status(battle, user)?;
                Ok(None)
            } else {
                battle.state.combatant_mut(user)?.status = Some(StatusCondition::sleep(remaining));
                Ok(Some(MoveFailureReason::Asleep))
            }
        }
        StatusType::Freeze => {
            if battle.rng.chance(20, "thaw") {
                cure_status(battle, user)?;
                Ok(None)
            } else {
                Ok(Some(MoveFailureReason::Frozen))
            }
        }
        StatusType::Paralysis => {
            if battle.rng.one_in(1, 4, "full paralysis") {
                Ok(Some(MoveFailureReason::FullyParalyzed))
            } else {
                Ok(None)
            }
        }
        _ => Ok(None),
    }
}

/// Starts weather. Returns false if the same weather is already active.
pub(crate) fn set_weather(battle: &mut Battle, kind: WeatherKind, turns: u8) -> bool {
    if battle.state.arena.weather_kind() == Some(kind) {
        return false;
    }
    debug!(?kind, turns, "weather started");
    battle.state.arena.weather = Some(Weather {
        kind,
        turns_remaining: turns,
    });
    battle.emit(BattleEvent::WeatherStarted { weather: kind });
    true
}
