use crate::battle::engine::Battle;
use crate::battle::state::{BattleState, CombatantRef, FieldPosition};
use crate::errors::BattleResult;
use schema::MoveTarget;

/// Targets for a move as the field stands right now.
///
/// A single-target move whose chosen slot emptied is redirected to the first
/// remaining opponent.
pub(super) fn resolve_targets(
    state: &BattleState,
    user: CombatantRef,
    selector: MoveTarget,
    chosen: Option<FieldPosition>,
) -> Vec<CombatantRef> {
    let opponents = state.active_on_side(user.side.opponent());
    match selector {
        MoveTarget::User => vec![user],
        MoveTarget::SingleOpponent => {
            if let Some(&(_, target)) = chosen.and_then(|pos| opponents.iter().find(|(p, _)| *p == pos)) {
                return vec![target];
            }
            opponents.first().map(|&(_, c)| vec![c]).unwrap_or_default()
        }
        MoveTarget::AllOpponents => opponents.into_iter().map(|(_, c)| c).collect(),
        MoveTarget::AllOthers => state
            .active_combatants()
            .into_iter()
            .map(|(_, c)| c)
            .filter(|&c| c != user)
            .collect(),
    }
}

/// The opponent that last hit `user` physically this turn, if it is still standing.
pub(super) fn counter_target(
    battle: &Battle,
    user: CombatantRef,
) -> BattleResult<Option<CombatantRef>> {
    let volatile = &battle.state.combatant(user)?.volatile;
    if volatile.physical_damage_taken == 0 {
        return Ok(None);
    }
    Ok(volatile
        .last_physical_attacker
        .filter(|&attacker| attacker.side != user.side && battle.state.is_active(attacker)))
}
