// Move resolution.
//
// One use of a move is a Move phase (legality, PP, targeting), one MoveEffect
// phase per strike, and a single MoveEnd phase for effects that happen once
// per use no matter how many strikes landed. Faint phases queued by a strike
// run before the next strike, so a fainted target drops out of the remaining
// strikes.

mod damage_effects;
mod special_effects;
mod stat_effects;
mod status_effects;
mod targeting;

pub(crate) use stat_effects::execute_stat_change;

use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::phases::{MoveEffectPhase, MoveEndPhase, MovePhase, Phase, PhaseOutcome};
use crate::battle::state::{BattleEvent, CombatantRef, MoveFailureReason, SkipReason};
use crate::battle::stats;
use crate::battle::triggers::{self, MoveContext, TriggerEvent, TriggerPayload};
use crate::errors::{BattleError, BattleResult};
use crate::pokemon::MoveSlot;
use schema::{HitCount, Move, MoveData, MoveEffect, PokemonType, Target};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub(crate) fn move_context(
    user: CombatantRef,
    target: Option<CombatantRef>,
    data: &MoveData,
) -> TriggerPayload {
    TriggerPayload::Move(MoveContext {
        user,
        target,
        move_used: data.id,
        move_type: data.move_type,
        category: data.category,
    })
}

fn fail(battle: &mut Battle, user: CombatantRef, move_used: Move, reason: MoveFailureReason) {
    debug!(?user, %move_used, ?reason, "move failed");
    battle.emit(BattleEvent::MoveFailed {
        user,
        move_used,
        reason,
    });
}

// --- MOVE ---

pub(crate) fn execute_move(battle: &mut Battle, phase: &MovePhase) -> BattleResult<PhaseOutcome> {
    let user = phase.user;
    if !battle.state.is_active(user) {
        let reason = if battle.state.combatant(user)?.is_fainted() {
            SkipReason::Fainted
        } else {
            SkipReason::NotOnField
        };
        debug!(?user, ?reason, "move skipped");
        battle.emit(BattleEvent::ActionSkipped {
            combatant: user,
            reason,
        });
        return Ok(PhaseOutcome::Done);
    }

    let move_used = battle
        .state
        .combatant(user)?
        .move_slot(phase.move_index)
        .map(|slot| slot.move_)
        .ok_or(BattleError::InvalidMoveSlot {
            combatant: user,
            slot: phase.move_index,
        })?;
    let dex = Arc::clone(&battle.dex);
    let data = dex.move_data(move_used)?;

    // Abilities get a say before the user's own condition does.
    let chosen = phase.target.and_then(|pos| battle.state.active_occupant(pos));
    let payload = move_context(user, chosen, data);
    if triggers::publish(battle, TriggerEvent::PreMove, &payload).flag() {
        fail(battle, user, move_used, MoveFailureReason::PreventedByAbility);
        return Ok(PhaseOutcome::Done);
    }
    if let Some(reason) = conditions::status_prevents_move(battle, user)? {
        fail(battle, user, move_used, reason);
        return Ok(PhaseOutcome::Done);
    }

    let spent = battle
        .state
        .combatant_mut(user)?
        .moves
        .get_mut(phase.move_index)
        .is_some_and(MoveSlot::use_pp);
    if !spent {
        fail(battle, user, move_used, MoveFailureReason::NoPpRemaining);
        return Ok(PhaseOutcome::Done);
    }

    info!(turn = battle.state.turn, ?user, move_used = %move_used, "move used");
    battle.emit(BattleEvent::MoveUsed { user, move_used });

    let targets = if data.is_counter() {
        match targeting::counter_target(battle, user)? {
            Some(attacker) => vec![attacker],
            None => {
                fail(battle, user, move_used, MoveFailureReason::NothingToCounter);
                return Ok(PhaseOutcome::Done);
            }
        }
    } else {
        targeting::resolve_targets(&battle.state, user, data.target, phase.target)
    };
    if targets.is_empty() {
        fail(battle, user, move_used, MoveFailureReason::NoTarget);
        return Ok(PhaseOutcome::Done);
    }

    if data.is_delayed() {
        special_effects::schedule_delayed(battle, user, data, &targets)?;
        return Ok(PhaseOutcome::Done);
    }

    battle
        .queue
        .unshift(Phase::MoveEffect(MoveEffectPhase::first(user, move_used, targets)));
    Ok(PhaseOutcome::Done)
}

// --- STRIKES ---

fn random_hit_count(battle: &mut Battle) -> u8 {
    match battle.rng.range(0, 100, "hit count") {
        0..=34 => 2,
        35..=69 => 3,
        70..=84 => 4,
        _ => 5,
    }
}

/// Base strikes from the move, plus extra strikes from abilities and items.
///
/// A multi-hit descriptor replaces the single strike and rules out extras,
/// as do the other exemptions in [`MoveData::accepts_extra_strikes`].
fn strike_count(
    battle: &mut Battle,
    phase: &MoveEffectPhase,
    data: &MoveData,
) -> (u8, u8) {
    let base = match data.hit_count() {
        Some(HitCount::Fixed(count)) => count.max(1),
        Some(HitCount::Random) => random_hit_count(battle),
        None => 1,
    };
    if phase.detached_user || !data.accepts_extra_strikes() {
        return (base, 0);
    }
    let payload = move_context(phase.user, phase.targets.first().copied(), data);
    let extra = triggers::publish(battle, TriggerEvent::ModifyHitCount, &payload).count();
    (base, extra.clamp(0, 8) as u8)
}

fn live_targets(battle: &Battle, phase: &MoveEffectPhase) -> Vec<CombatantRef> {
    phase
        .targets
        .iter()
        .copied()
        .filter(|target| !phase.missed.contains(target) && battle.state.is_active(*target))
        .collect()
}

/// One strike against one target. Returns the damage dealt if the strike landed.
fn strike_target(
    battle: &mut Battle,
    phase: &MoveEffectPhase,
    data: &MoveData,
    target: CombatantRef,
) -> BattleResult<Option<u16>> {
    let user = phase.user;
    if target != user {
        let effectiveness =
            PokemonType::effectiveness_against(data.move_type, &battle.state.combatant(target)?.types);
        let immune = (data.is_damaging() && effectiveness == 0.0)
            || triggers::publish(
                battle,
                TriggerEvent::MoveImmunity,
                &move_context(user, Some(target), data),
            )
            .flag();
        if immune {
            battle.emit(BattleEvent::NoEffect {
                target,
                move_used: data.id,
            });
            return Ok(None);
        }
    }

    let dealt = if data.is_damaging() {
        damage_effects::apply_strike_damage(battle, phase, data, target)?
    } else {
        0
    };

    for effect in &data.effects {
        match *effect {
            MoveEffect::Status { status, chance } if target != user => {
                status_effects::apply_status_effect(battle, target, status, chance)?;
            }
            MoveEffect::StatChange {
                target: Target::Target,
                stat,
                stages,
                chance,
            } => stat_effects::queue_stat_change(battle, user, target, stat, stages, chance),
            MoveEffect::Drain(percent) => {
                damage_effects::apply_drain(battle, user, dealt, percent)?;
            }
            _ => {}
        }
    }
    Ok(Some(dealt))
}

pub(crate) fn execute_move_effect(
    battle: &mut Battle,
    phase: &MoveEffectPhase,
) -> BattleResult<PhaseOutcome> {
    let user = phase.user;
    if !phase.detached_user && !battle.state.is_active(user) {
        debug!(?user, strike = phase.strike, "user left the field; strikes abandoned");
        return Ok(PhaseOutcome::Done);
    }
    let dex = Arc::clone(&battle.dex);
    let data = dex.move_data(phase.move_used)?;
    let mut next = phase.clone();

    if phase.strike == 0 {
        for effect in &data.effects {
            if let MoveEffect::Unimplemented(name) = effect {
                warn!(move_used = %data.id, effect = %name, "unhandled effect descriptor; skipped");
            }
        }
        let (base, extra) = strike_count(battle, phase, data);
        next.total_strikes = base + extra;
        next.extra_strikes = extra;

        // Accuracy is rolled once per target, on the first strike.
        for target in live_targets(battle, &next) {
            if target == user {
                continue;
            }
            if !stats::move_hits(battle, user, target, data.accuracy)? {
                battle.emit(BattleEvent::MoveMissed {
                    user,
                    target,
                    move_used: data.id,
                });
                next.missed.push(target);
            }
        }
    }

    for target in live_targets(battle, &next) {
        if let Some(dealt) = strike_target(battle, &next, data, target)? {
            next.landed = true;
            next.damage_so_far += u32::from(dealt);
        }
    }
    next.strike += 1;

    if next.strike < next.total_strikes && !live_targets(battle, &next).is_empty() {
        battle.queue.unshift(Phase::MoveEffect(next));
    } else {
        battle.queue.unshift(Phase::MoveEnd(MoveEndPhase {
            user,
            move_used: data.id,
            targets: next.targets,
            strikes: next.strike,
            total_damage: next.damage_so_far,
            landed: next.landed,
            detached_user: next.detached_user,
        }));
    }
    Ok(PhaseOutcome::Done)
}

// --- ONCE PER USE ---

pub(crate) fn execute_move_end(
    battle: &mut Battle,
    phase: &MoveEndPhase,
) -> BattleResult<PhaseOutcome> {
    let user = phase.user;
    let dex = Arc::clone(&battle.dex);
    let data = dex.move_data(phase.move_used)?;

    if phase.strikes > 1 || data.hit_count().is_some() {
        battle.emit(BattleEvent::HitCount {
            user,
            hits: phase.strikes,
        });
    }
    if phase.detached_user || !battle.state.is_active(user) {
        return Ok(PhaseOutcome::Done);
    }

    let payload = move_context(user, phase.targets.first().copied(), data);
    triggers::publish(battle, TriggerEvent::PostMoveAllHits, &payload);

    for effect in &data.effects {
        match *effect {
            MoveEffect::StatChange {
                target: Target::User,
                stat,
                stages,
                chance,
            } if phase.landed => stat_effects::queue_stat_change(battle, user, user, stat, stages, chance),
            MoveEffect::Recoil(percent) => {
                damage_effects::apply_recoil(battle, user, phase.total_damage, percent)?;
            }
            MoveEffect::Sacrificial => damage_effects::apply_self_knockout(battle, user)?,
            MoveEffect::SelfSwitch if phase.landed => special_effects::self_switch(battle, user)?,
            MoveEffect::SetWeather(kind) => special_effects::apply_weather(battle, kind),
            MoveEffect::Spikes => special_effects::apply_spikes(battle, user),
            MoveEffect::Tailwind { turns } => special_effects::apply_tailwind(battle, user, turns),
            _ => {}
        }
    }
    Ok(PhaseOutcome::Done)
}
