// Capture attempts against wild combatants.
//
// The maths lives in `calculation` and never touches the battle; this module
// gathers its inputs, reports each check as an event and hands a successful
// capture off to whoever manages the player's roster.

pub mod calculation;
pub mod validation;

pub use calculation::*;
pub use validation::*;

use crate::battle::engine::Battle;
use crate::battle::phases::{CapturePhase, PhaseOutcome};
use crate::battle::state::{BattleEvent, CombatantRef, SkipReason};
use crate::errors::{BattleResult, DeclineReason};
use crate::pokemon::Combatant;
use tracing::info;

/// A captured combatant waiting for the roster layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub combatant: Combatant,
    /// The receiving roster is already at capacity; the roster layer must
    /// decide what to release.
    pub roster_full: bool,
}

pub(crate) fn execute_capture(
    battle: &mut Battle,
    phase: &CapturePhase,
) -> BattleResult<PhaseOutcome> {
    let Some(thrower) = battle.state.active_occupant(phase.thrower) else {
        return Ok(PhaseOutcome::Done);
    };
    let target = match capture_target(&battle.state, phase.target) {
        Ok(target) => target,
        Err(reason) => {
            info!(?thrower, position = ?phase.target, %reason, "capture declined");
            battle.emit(BattleEvent::ActionSkipped {
                combatant: thrower,
                reason: SkipReason::NoLongerValid,
            });
            battle.emit(BattleEvent::OperationDeclined { reason });
            return Ok(PhaseOutcome::Done);
        }
    };

    let combatant = battle.state.combatant(target)?;
    let species = battle.dex.species(combatant.species)?;
    let rate = modified_rate(
        combatant.max_hp(),
        combatant.current_hp(),
        species.catch_rate,
        phase.ball.multiplier(),
        status_multiplier(combatant.status.map(|status| status.kind)),
    );
    let attempt = CaptureAttempt {
        modified_rate: rate,
        guaranteed: phase.ball.is_guaranteed(),
        obtainable: species.obtainable,
    };
    let result = resolve_attempt(attempt, &battle.config.capture, &mut battle.rng);

    info!(
        ?target,
        ball = %phase.ball,
        modified_rate = rate,
        critical = result.critical,
        success = result.success,
        "capture attempted"
    );
    battle.emit(BattleEvent::CaptureAttempted {
        target,
        ball: phase.ball,
        modified_rate: rate,
        critical: result.critical,
    });
    for (index, &passed) in result.checks.iter().enumerate() {
        battle.emit(BattleEvent::CaptureCheck {
            target,
            check: index as u8 + 1,
            passed,
        });
    }

    let checks_passed = result.checks_passed();
    if !result.success {
        battle.emit(BattleEvent::CaptureFailed {
            target,
            checks_passed,
        });
        return Ok(PhaseOutcome::Done);
    }

    battle.emit(BattleEvent::CaptureSucceeded {
        target,
        checks_passed,
    });
    hand_off(battle, target)?;
    Ok(PhaseOutcome::Done)
}

/// Takes the captured combatant off the field and queues it for the roster layer.
fn hand_off(battle: &mut Battle, target: CombatantRef) -> BattleResult<()> {
    let position = battle.state.position_of(target);
    let combatant = battle.state.combatant_mut(target)?;
    combatant.captured = true;
    combatant.on_recall();
    let captured = combatant.clone();
    if let Some(position) = position {
        battle.state.side_mut(target.side).field[position.slot] = None;
    }

    let roster_full = roster_full(&battle.state, battle.config.roster_capacity);
    battle.emit(BattleEvent::AcquisitionHandOff {
        target,
        roster_full,
    });
    if roster_full {
        battle.emit(BattleEvent::OperationDeclined {
            reason: DeclineReason::RosterFull,
        });
    }
    battle.acquisitions.push(Acquisition {
        combatant: captured,
        roster_full,
    });
    Ok(())
}
