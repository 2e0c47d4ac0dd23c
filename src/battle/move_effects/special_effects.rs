use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::modifiers::{self, ModifierKind};
use crate::battle::phases::{Phase, SwitchPhase};
use crate::battle::positional_tags::{self, PositionalTagKind};
use crate::battle::state::{BattleEvent, CombatantRef, Controller, MoveFailureReason};
use crate::errors::BattleResult;
use schema::{MoveData, MoveEffect, WeatherKind};
use tracing::debug;

const WEATHER_TURNS: u8 = 5;
const MAX_SPIKES: u8 = 3;

/// Registers the slot-bound tag of a delayed move instead of striking now.
pub(super) fn schedule_delayed(
    battle: &mut Battle,
    user: CombatantRef,
    data: &MoveData,
    targets: &[CombatantRef],
) -> BattleResult<()> {
    for effect in &data.effects {
        let (kind, target, turns) = match *effect {
            MoveEffect::DelayedAttack { turns } => {
                let Some(target) = targets.first().copied() else {
                    continue;
                };
                (
                    PositionalTagKind::DelayedAttack {
                        move_used: data.id,
                        source: user,
                    },
                    target,
                    turns,
                )
            }
            MoveEffect::DelayedHeal { turns, percent } => {
                let max_hp = battle.state.combatant(user)?.max_hp();
                let amount = (u32::from(max_hp) * u32::from(percent) / 100).max(1) as u16;
                (
                    PositionalTagKind::DelayedHeal {
                        amount,
                        source: user,
                    },
                    user,
                    turns,
                )
            }
            _ => continue,
        };
        let Some(position) = battle.state.position_of(target) else {
            continue;
        };
        if let Err(reason) = positional_tags::schedule(battle, kind, position, user.side, turns) {
            battle.emit(BattleEvent::MoveFailed {
                user,
                move_used: data.id,
                reason: MoveFailureReason::Declined(reason),
            });
        }
    }
    Ok(())
}

/// Takes the user off the field after its move.
///
/// Wild combatants leave the battle and their slot stays empty. Anyone else
/// is swapped for the first healthy benched ally; with no bench, nothing happens.
pub(super) fn self_switch(battle: &mut Battle, user: CombatantRef) -> BattleResult<()> {
    let Some(position) = battle.state.position_of(user) else {
        return Ok(());
    };
    let side = battle.state.side(user.side);
    if side.controller == Controller::Wild {
        let combatant = battle.state.combatant_mut(user)?;
        combatant.departed = true;
        combatant.on_recall();
        battle.state.side_mut(user.side).field[position.slot] = None;
        debug!(?user, ?position, "wild combatant left the field");
        battle.emit(BattleEvent::LeftField {
            position,
            combatant: user,
        });
        return Ok(());
    }

    let Some(&party_index) = side.bench().first() else {
        debug!(?user, "no bench to switch to");
        return Ok(());
    };
    battle.queue.unshift(Phase::Switch(SwitchPhase {
        position,
        outgoing: user,
        party_index,
    }));
    Ok(())
}

pub(super) fn apply_weather(battle: &mut Battle, kind: WeatherKind) {
    if !conditions::set_weather(battle, kind, WEATHER_TURNS) {
        debug!(?kind, "weather already active");
    }
}

/// Adds a spikes layer to the opposing side.
pub(super) fn apply_spikes(battle: &mut Battle, user: CombatantRef) {
    let side_id = user.side.opponent();
    let side = battle.state.side_mut(side_id);
    if side.spikes >= MAX_SPIKES {
        return;
    }
    side.spikes += 1;
    let layers = side.spikes;
    battle.emit(BattleEvent::SpikesSet {
        side: side_id,
        layers,
    });
}

pub(super) fn apply_tailwind(battle: &mut Battle, user: CombatantRef, turns: u8) {
    modifiers::add_side_modifier(battle, user.side, ModifierKind::Tailwind, turns);
}
