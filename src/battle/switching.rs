// Field membership: switching, summoning, fainting and end-of-turn replacements.

use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::phases::{FaintPhase, Phase, PhaseOutcome, SummonPhase, SwitchPhase};
use crate::battle::state::{
    BattleEvent, BattleState, CombatantRef, Controller, DamageSource, FieldPosition, SideId,
    SkipReason,
};
use crate::battle::triggers::{self, EntryContext, FaintContext, TriggerEvent, TriggerPayload};
use crate::errors::{BattleError, BattleResult};
use schema::{AbilityId, PokemonType};
use tracing::{debug, info};

/// A replacement chosen for an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementChoice {
    pub position: FieldPosition,
    pub party_index: usize,
}

/// Empty slots that must be refilled before the next turn.
///
/// Wild sides never refill. A side only needs as many replacements as it
/// has healthy benched members.
pub fn vacancies(state: &BattleState) -> Vec<FieldPosition> {
    let mut found = Vec::new();
    for side_id in SideId::BOTH {
        let side = state.side(side_id);
        if side.controller == Controller::Wild {
            continue;
        }
        let bench = side.bench().len();
        found.extend(
            (0..side.field.len())
                .map(|slot| FieldPosition::new(side_id, slot))
                .filter(|&pos| state.active_occupant(pos).is_none())
                .take(bench),
        );
    }
    found
}

fn spikes_damage(max_hp: u16, layers: u8) -> u16 {
    let divisor = match layers {
        0 => return 0,
        1 => 8,
        2 => 6,
        _ => 4,
    };
    (max_hp / divisor).max(1)
}

fn is_grounded(state: &BattleState, combatant: CombatantRef) -> BattleResult<bool> {
    let flying = state.combatant(combatant)?.has_type(PokemonType::Flying);
    let levitating = state.effective_ability(combatant) == Some(AbilityId::Levitate);
    Ok(!flying && !levitating)
}

// --- SWITCH ---

pub(crate) fn execute_switch(battle: &mut Battle, phase: &SwitchPhase) -> BattleResult<PhaseOutcome> {
    let outgoing = phase.outgoing;
    let incoming = CombatantRef::new(outgoing.side, phase.party_index);
    let still_there = battle.state.occupant(phase.position) == Some(outgoing);
    let incoming_ready = battle
        .state
        .side(outgoing.side)
        .bench()
        .contains(&phase.party_index);

    if !still_there || !battle.state.is_active(outgoing) || !incoming_ready {
        let reason = if battle.state.combatant(outgoing)?.is_fainted() {
            SkipReason::Fainted
        } else {
            SkipReason::NoLongerValid
        };
        debug!(?outgoing, ?incoming, ?reason, "switch skipped");
        battle.emit(BattleEvent::ActionSkipped {
            combatant: outgoing,
            reason,
        });
        return Ok(PhaseOutcome::Done);
    }

    battle.state.combatant_mut(outgoing)?.on_recall();
    battle.state.side_mut(outgoing.side).field[phase.position.slot] = None;
    info!(?outgoing, ?incoming, position = ?phase.position, "switched out");
    battle.emit(BattleEvent::SwitchedOut {
        position: phase.position,
        combatant: outgoing,
    });
    battle.queue.unshift(Phase::Summon(SummonPhase {
        position: phase.position,
        party_index: phase.party_index,
    }));
    Ok(PhaseOutcome::Done)
}

// --- SUMMON ---

pub(crate) fn execute_summon(battle: &mut Battle, phase: &SummonPhase) -> BattleResult<PhaseOutcome> {
    let position = phase.position;
    let incoming = CombatantRef::new(position.side, phase.party_index);
    if !battle.state.is_valid_position(position) {
        return Err(BattleError::InvalidPosition(position));
    }
    if battle.state.occupant(position).is_some() {
        debug!(?position, "slot already filled; summon skipped");
        return Ok(PhaseOutcome::Done);
    }
    let combatant = battle.state.combatant_mut(incoming)?;
    if combatant.field_slot.is_some() || !combatant.is_available() {
        debug!(?incoming, "combatant cannot be summoned");
        return Ok(PhaseOutcome::Done);
    }
    combatant.field_slot = Some(position.slot);
    battle.state.side_mut(position.side).field[position.slot] = Some(phase.party_index);
    info!(?incoming, ?position, "summoned");
    battle.emit(BattleEvent::SwitchedIn {
        position,
        combatant: incoming,
    });

    let layers = battle.state.side(position.side).spikes;
    if layers > 0 && is_grounded(&battle.state, incoming)? {
        let max_hp = battle.state.combatant(incoming)?.max_hp();
        conditions::deal_damage(
            battle,
            incoming,
            spikes_damage(max_hp, layers),
            DamageSource::Spikes,
            None,
        )?;
    }

    if battle.state.is_active(incoming) {
        triggers::publish(
            battle,
            TriggerEvent::Entry,
            &TriggerPayload::Entry(EntryContext {
                combatant: incoming,
                position,
            }),
        );
    }
    Ok(PhaseOutcome::Done)
}

// --- FAINT ---

pub(crate) fn execute_faint(battle: &mut Battle, phase: &FaintPhase) -> BattleResult<PhaseOutcome> {
    let fainted = phase.combatant;
    let combatant = battle.state.combatant(fainted)?;
    if !combatant.is_fainted() {
        return Ok(PhaseOutcome::Done);
    }
    let Some(position) = battle.state.position_of(fainted) else {
        // Already removed from the field.
        return Ok(PhaseOutcome::Done);
    };

    info!(?fainted, ?position, "fainted");
    battle.emit(BattleEvent::Fainted {
        position,
        combatant: fainted,
    });
    battle.state.combatant_mut(fainted)?.on_recall();
    battle.state.side_mut(fainted.side).field[position.slot] = None;

    // Its queued action can never run now.
    let queued_move = |phase: &Phase| matches!(phase, Phase::Move(m) if m.user == fainted);
    if battle.queue.pending().any(queued_move) {
        battle.queue.remove_where(queued_move);
        battle.emit(BattleEvent::ActionSkipped {
            combatant: fainted,
            reason: SkipReason::Fainted,
        });
    }

    triggers::publish(
        battle,
        TriggerEvent::Faint,
        &TriggerPayload::Faint(FaintContext {
            fainted,
            source: phase.source,
        }),
    );
    Ok(PhaseOutcome::Done)
}

// --- REPLACEMENT ---

/// Refills empty slots, parking for the external layer's choices first.
pub(crate) fn execute_replacement(battle: &mut Battle) -> BattleResult<PhaseOutcome> {
    if let Some(choices) = battle.pending_replacements.take() {
        for choice in choices {
            battle.queue.unshift(Phase::Summon(SummonPhase {
                position: choice.position,
                party_index: choice.party_index,
            }));
        }
        return Ok(PhaseOutcome::Done);
    }

    let positions = vacancies(&battle.state);
    if positions.is_empty() {
        return Ok(PhaseOutcome::Done);
    }
    debug!(?positions, "replacements required");
    battle.emit(BattleEvent::ReplacementsRequired { positions });
    Ok(PhaseOutcome::AwaitReplacements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 12)]
    #[case(2, 16)]
    #[case(3, 24)]
    #[case(7, 24)]
    fn test_spikes_damage_by_layer(#[case] layers: u8, #[case] expected: u16) {
        assert_eq!(spikes_damage(96, layers), expected);
    }

    #[test]
    fn test_spikes_damage_is_at_least_one() {
        assert_eq!(spikes_damage(5, 1), 1);
    }
}
