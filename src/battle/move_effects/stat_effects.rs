use crate::battle::engine::Battle;
use crate::battle::phases::{Phase, PhaseOutcome, StatChangePhase};
use crate::battle::state::{BattleEvent, CombatantRef};
use crate::battle::triggers::{self, StatChangeContext, TriggerEvent, TriggerPayload};
use crate::errors::BattleResult;
use schema::StatType;
use tracing::debug;

/// Rolls a stat-change secondary and, if it procs, queues the change.
pub(super) fn queue_stat_change(
    battle: &mut Battle,
    user: CombatantRef,
    target: CombatantRef,
    stat: StatType,
    stages: i8,
    chance: u8,
) {
    if chance < 100 && !battle.rng.chance(chance, "secondary stat change") {
        return;
    }
    battle.queue.unshift(Phase::StatChange(StatChangePhase {
        target,
        stat,
        stages,
        source: Some(user),
    }));
}

/// Applies a queued stage change.
///
/// A change that would push a stage past its limit is blocked and reported;
/// otherwise the clamped delta is applied and published.
pub(crate) fn execute_stat_change(
    battle: &mut Battle,
    phase: &StatChangePhase,
) -> BattleResult<PhaseOutcome> {
    let target = phase.target;
    if !battle.state.is_active(target) {
        return Ok(PhaseOutcome::Done);
    }
    let (old_stage, new_stage) = battle
        .state
        .combatant_mut(target)?
        .modify_stat_stage(phase.stat, phase.stages);

    if old_stage == new_stage {
        battle.emit(BattleEvent::StatChangeBlocked {
            target,
            stat: phase.stat,
        });
        return Ok(PhaseOutcome::Done);
    }

    debug!(?target, stat = ?phase.stat, old_stage, new_stage, "stat stage changed");
    battle.emit(BattleEvent::StatStageChanged {
        target,
        stat: phase.stat,
        old_stage,
        new_stage,
    });
    triggers::publish(
        battle,
        TriggerEvent::StatStageChanged,
        &TriggerPayload::StatChange(StatChangeContext {
            target,
            stat: phase.stat,
            delta: new_stage - old_stage,
            source: phase.source,
        }),
    );
    Ok(PhaseOutcome::Done)
}
