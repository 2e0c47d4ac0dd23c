use crate::battle::state::{BattleState, CombatantRef, FieldPosition, SideId};
use crate::errors::DeclineReason;
use schema::BattleKind;

pub fn is_capture_allowed(kind: BattleKind) -> bool {
    kind == BattleKind::Wild
}

/// The combatant an attempt would target, if the attempt is allowed at all.
pub fn capture_target(
    state: &BattleState,
    target: FieldPosition,
) -> Result<CombatantRef, DeclineReason> {
    if !is_capture_allowed(state.kind) || target.side != SideId::Enemy {
        return Err(DeclineReason::CaptureNotAllowed);
    }
    state
        .active_occupant(target)
        .ok_or(DeclineReason::CaptureNotAllowed)
}

/// Whether the receiving roster has no room for another member.
pub fn roster_full(state: &BattleState, capacity: usize) -> bool {
    state.side(SideId::Player).roster.len() >= capacity
}
