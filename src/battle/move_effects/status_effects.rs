use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::state::CombatantRef;
use crate::errors::BattleResult;
use schema::StatusType;
use tracing::trace;

/// Rolls a secondary status effect against `target`.
///
/// A chance of 100 or more is guaranteed and draws nothing from the RNG.
/// Targets that already carry a status, or whose type makes them immune,
/// are skipped before the roll.
pub(super) fn apply_status_effect(
    battle: &mut Battle,
    target: CombatantRef,
    status: StatusType,
    chance: u8,
) -> BattleResult<bool> {
    let combatant = battle.state.combatant(target)?;
    if combatant.is_fainted()
        || combatant.status.is_some()
        || conditions::status_immune(combatant, status)
    {
        return Ok(false);
    }
    if chance < 100 && !battle.rng.chance(chance, "secondary status") {
        trace!(?target, ?status, chance, "status roll failed");
        return Ok(false);
    }
    conditions::apply_status(battle, target, status)
}
