// Turn actions that are not moves: bag items and fleeing.

use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::phases::{FleePhase, PhaseOutcome, UseItemPhase};
use crate::battle::state::{BattleEvent, BattleOutcome, CombatantRef, SideId, SkipReason};
use crate::battle::stats;
use crate::errors::BattleResult;
use schema::BattleKind;
use tracing::{debug, info};

pub(crate) fn execute_use_item(
    battle: &mut Battle,
    phase: &UseItemPhase,
) -> BattleResult<PhaseOutcome> {
    let target = CombatantRef::new(phase.user.side, phase.party_index);
    let Some(user) = battle.state.active_occupant(phase.user) else {
        return Ok(PhaseOutcome::Done);
    };
    if battle.state.combatant(target)?.is_fainted() {
        battle.emit(BattleEvent::ActionSkipped {
            combatant: user,
            reason: SkipReason::NoLongerValid,
        });
        return Ok(PhaseOutcome::Done);
    }

    info!(?target, item = %phase.item, "bag item used");
    battle.emit(BattleEvent::BagItemUsed {
        target,
        item: phase.item,
    });
    if let Some(amount) = phase.item.heal_amount() {
        conditions::heal(battle, target, amount)?;
    }
    if phase.item.cures_status() {
        conditions::cure_status(battle, target)?;
    }
    Ok(PhaseOutcome::Done)
}

/// Escape odds out of 256.
///
/// `min(255, floor(speed * 128 / enemy_speed) + 30 * attempts)`, where
/// `attempts` counts the failed tries before this one.
pub fn escape_odds(speed: u32, enemy_speed: u32, attempts: u8) -> u32 {
    if enemy_speed == 0 {
        return 256;
    }
    let base = u64::from(speed) * 128 / u64::from(enemy_speed);
    (base + 30 * u64::from(attempts)).min(255) as u32
}

pub(crate) fn execute_flee(battle: &mut Battle, phase: &FleePhase) -> BattleResult<PhaseOutcome> {
    let Some(runner) = battle.state.active_occupant(phase.position) else {
        return Ok(PhaseOutcome::Done);
    };
    if battle.state.kind != BattleKind::Wild {
        battle.emit(BattleEvent::ActionSkipped {
            combatant: runner,
            reason: SkipReason::NoLongerValid,
        });
        return Ok(PhaseOutcome::Done);
    }

    let speed = stats::effective_speed(battle, runner)?;
    let enemies = battle.state.active_on_side(SideId::Enemy);
    let mut total = 0u64;
    for &(_, enemy) in &enemies {
        total += u64::from(stats::effective_speed(battle, enemy)?);
    }
    let enemy_speed = if enemies.is_empty() {
        0
    } else {
        (total / enemies.len() as u64) as u32
    };

    let odds = escape_odds(speed, enemy_speed, battle.state.flee_attempts);
    battle.state.flee_attempts = battle.state.flee_attempts.saturating_add(1);
    let success = battle.rng.range(0, 256, "flee") < odds;
    debug!(speed, enemy_speed, odds, success, "flee attempt");
    battle.emit(BattleEvent::FleeAttempted { success });
    if success {
        battle.finish(BattleOutcome::Fled);
    }
    Ok(PhaseOutcome::Done)
}
