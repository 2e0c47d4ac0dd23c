// Delayed, slot-bound effects.
//
// A tag remembers a field position, never a combatant. When it fires it is
// resolved against whoever stands in that slot at that moment; an empty slot
// or an unsatisfiable condition discards the tag without any event.

use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::phases::{MoveEffectPhase, Phase};
use crate::battle::state::{BattleEvent, CombatantRef, FieldPosition, SideId};
use crate::errors::{BattleResult, DeclineReason};
use schema::Move;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionalTagKind {
    /// Strikes the slot with the source's move and stats.
    DelayedAttack { move_used: Move, source: CombatantRef },
    /// Restores a fixed amount to whoever occupies the slot.
    DelayedHeal { amount: u16, source: CombatantRef },
}

impl PositionalTagKind {
    fn decline_reason(&self) -> DeclineReason {
        match self {
            PositionalTagKind::DelayedAttack { .. } => DeclineReason::DuplicateDelayedAttack,
            PositionalTagKind::DelayedHeal { .. } => DeclineReason::DuplicateDelayedHeal,
        }
    }

    fn same_family(&self, other: &PositionalTagKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalTag {
    pub id: u64,
    pub kind: PositionalTagKind,
    pub created_turn: u32,
    pub turns_remaining: u8,
    pub target: FieldPosition,
    pub source_side: SideId,
}

/// Pending tags in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalTagManager {
    tags: Vec<PositionalTag>,
    next_id: u64,
}

impl PositionalTagManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tag that fires after `duration` turn boundaries, the
    /// boundary of the creation turn included.
    ///
    /// At most one tag of each kind may target a given position.
    pub fn schedule(
        &mut self,
        kind: PositionalTagKind,
        target: FieldPosition,
        source_side: SideId,
        created_turn: u32,
        duration: u8,
    ) -> Result<u64, DeclineReason> {
        if self
            .tags
            .iter()
            .any(|tag| tag.target == target && tag.kind.same_family(&kind))
        {
            return Err(kind.decline_reason());
        }
        self.next_id += 1;
        let id = self.next_id;
        self.tags.push(PositionalTag {
            id,
            kind,
            created_turn,
            turns_remaining: duration.max(1),
            target,
            source_side,
        });
        Ok(id)
    }

    /// Counts every tag down by one turn and removes the ones that are due.
    ///
    /// Due tags come back in the order they were created.
    pub fn advance(&mut self) -> Vec<PositionalTag> {
        for tag in self.tags.iter_mut() {
            tag.turns_remaining = tag.turns_remaining.saturating_sub(1);
        }
        let (due, pending): (Vec<_>, Vec<_>) = self
            .tags
            .drain(..)
            .partition(|tag| tag.turns_remaining == 0);
        self.tags = pending;
        due
    }

    pub fn tags(&self) -> &[PositionalTag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Schedules a tag, reporting a decline as an event.
pub(crate) fn schedule(
    battle: &mut Battle,
    kind: PositionalTagKind,
    target: FieldPosition,
    source_side: SideId,
    duration: u8,
) -> Result<u64, DeclineReason> {
    let turn = battle.state.turn;
    match battle
        .state
        .positional_tags
        .schedule(kind, target, source_side, turn, duration)
    {
        Ok(tag_id) => {
            debug!(tag_id, ?target, turn, duration, "positional tag scheduled");
            battle.emit(BattleEvent::TagScheduled {
                tag_id,
                position: target,
            });
            Ok(tag_id)
        }
        Err(reason) => {
            info!(?target, %reason, "positional tag declined");
            battle.emit(BattleEvent::OperationDeclined { reason });
            Err(reason)
        }
    }
}

/// Resolves a due tag against the current occupant of its slot.
pub(crate) fn fire(battle: &mut Battle, tag: &PositionalTag) -> BattleResult<()> {
    let Some(occupant) = battle.state.active_occupant(tag.target) else {
        debug!(tag_id = tag.id, position = ?tag.target, "slot empty; tag discarded");
        return Ok(());
    };

    match &tag.kind {
        PositionalTagKind::DelayedAttack { move_used, source } => {
            if occupant == *source || battle.state.combatant(*source).is_err() {
                debug!(tag_id = tag.id, "delayed attack has no valid target; discarded");
                return Ok(());
            }
            battle.queue.unshift(Phase::MoveEffect(
                MoveEffectPhase::first(*source, *move_used, vec![occupant]).detached(),
            ));
        }
        PositionalTagKind::DelayedHeal { amount, .. } => {
            let combatant = battle.state.combatant(occupant)?;
            if combatant.current_hp() >= combatant.max_hp() {
                debug!(tag_id = tag.id, "occupant at full health; delayed heal discarded");
                return Ok(());
            }
            battle.emit(BattleEvent::DelayedHealLanded { target: occupant });
            conditions::heal(battle, occupant, *amount)?;
        }
    }
    Ok(())
}
