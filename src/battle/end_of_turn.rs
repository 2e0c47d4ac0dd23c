// End-of-turn processing.
//
// A turn closes with one TurnBoundary phase that advances the positional tags
// and the turn counter together, followed by each due tag, the weather tick,
// the status tick and finally TurnEnd, which hands over to the next TurnInit.

use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::phases::{Phase, PhaseOutcome};
use crate::battle::positional_tags;
use crate::battle::state::{BattleEvent, DamageSource};
use crate::battle::switching;
use crate::battle::triggers::{self, TriggerEvent, TriggerPayload};
use crate::battle::turn_order;
use crate::errors::BattleResult;
use crate::pokemon::{Combatant, StatusCondition};
use schema::{PokemonType, StatusType, WeatherKind};
use tracing::{debug, info};

pub(crate) fn execute_turn_boundary(battle: &mut Battle) -> BattleResult<PhaseOutcome> {
    let due = battle.state.positional_tags.advance();
    battle.state.turn += 1;
    debug!(turn = battle.state.turn, due = due.len(), "turn boundary");
    for tag in due {
        battle.queue.unshift(Phase::FirePositionalTag(tag));
    }
    battle.queue.unshift(Phase::WeatherTick);
    battle.queue.unshift(Phase::StatusTick);
    battle.queue.unshift(Phase::TurnEnd);
    Ok(PhaseOutcome::Done)
}

pub(crate) fn execute_fire_tag(
    battle: &mut Battle,
    tag: &positional_tags::PositionalTag,
) -> BattleResult<PhaseOutcome> {
    positional_tags::fire(battle, tag)?;
    Ok(PhaseOutcome::Done)
}

fn weather_immune(combatant: &Combatant, weather: WeatherKind) -> bool {
    match weather {
        WeatherKind::Sandstorm => [PokemonType::Rock, PokemonType::Ground, PokemonType::Steel]
            .iter()
            .any(|&t| combatant.has_type(t)),
        WeatherKind::Hail => combatant.has_type(PokemonType::Ice),
        WeatherKind::Sun | WeatherKind::Rain => true,
    }
}

pub(crate) fn execute_weather_tick(battle: &mut Battle) -> BattleResult<PhaseOutcome> {
    let Some(weather) = battle.state.arena.weather else {
        return Ok(PhaseOutcome::Done);
    };

    for (_, combatant) in turn_order::speed_order(battle) {
        if !battle.state.is_active(combatant) {
            continue;
        }
        let data = battle.state.combatant(combatant)?;
        if weather_immune(data, weather.kind) {
            continue;
        }
        let amount = (data.max_hp() / 16).max(1);
        conditions::deal_damage(
            battle,
            combatant,
            amount,
            DamageSource::Weather(weather.kind),
            None,
        )?;
    }

    let remaining = weather.turns_remaining.saturating_sub(1);
    if remaining == 0 {
        info!(weather = ?weather.kind, "weather ended");
        battle.state.arena.weather = None;
        battle.emit(BattleEvent::WeatherEnded {
            weather: weather.kind,
        });
    } else if let Some(active) = battle.state.arena.weather.as_mut() {
        active.turns_remaining = remaining;
    }
    Ok(PhaseOutcome::Done)
}

/// Residual status damage for one combatant, advancing the toxic counter.
fn residual_damage(combatant: &mut Combatant) -> Option<(StatusType, u16)> {
    let status = combatant.status?;
    let max_hp = combatant.max_hp();
    let amount = match status.kind {
        StatusType::Burn => max_hp / 16,
        StatusType::Poison => max_hp / 8,
        StatusType::Toxic => {
            let step = status.counter.saturating_add(1).min(15);
            combatant.status = Some(StatusCondition {
                kind: StatusType::Toxic,
                counter: step,
            });
            max_hp / 16 * u16::from(step)
        }
        _ => return None,
    };
    Some((status.kind, amount.max(1)))
}

pub(crate) fn execute_status_tick(battle: &mut Battle) -> BattleResult<PhaseOutcome> {
    for (_, combatant) in turn_order::speed_order(battle) {
        if !battle.state.is_active(combatant) {
            continue;
        }
        if let Some((kind, amount)) = residual_damage(battle.state.combatant_mut(combatant)?) {
            conditions::deal_damage(battle, combatant, amount, DamageSource::Status(kind), None)?;
        }
    }
    Ok(PhaseOutcome::Done)
}

pub(crate) fn execute_turn_end(battle: &mut Battle) -> BattleResult<PhaseOutcome> {
    triggers::publish(battle, TriggerEvent::TurnEnd, &TriggerPayload::TurnEnd);

    for side in battle.state.sides.iter_mut() {
        for combatant in side.roster.iter_mut() {
            combatant.volatile.clear_turn_data();
        }
    }
    let finished = battle.state.turn.saturating_sub(1);
    battle.emit(BattleEvent::TurnEnded { turn: finished });

    if !switching::vacancies(&battle.state).is_empty() {
        battle.queue.unshift(Phase::Replacement);
    }
    battle.queue.push(Phase::TurnInit);
    Ok(PhaseOutcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::Dex;
    use schema::{Move, Species};

    fn combatant(species: Species) -> Combatant {
        let dex = Dex::builtin().unwrap();
        let tackle = dex.move_data(Move::Tackle).unwrap();
        Combatant::new(dex.species(species).unwrap(), 50, &[tackle])
    }

    #[test]
    fn test_toxic_escalates() {
        let mut pikachu = combatant(Species::Pikachu); // 95 HP
        pikachu.status = Some(StatusCondition::new(StatusType::Toxic));
        assert_eq!(residual_damage(&mut pikachu), Some((StatusType::Toxic, 5)));
        assert_eq!(residual_damage(&mut pikachu), Some((StatusType::Toxic, 10)));
        assert_eq!(residual_damage(&mut pikachu), Some((StatusType::Toxic, 15)));
    }

    #[test]
    fn test_burn_and_poison_fractions() {
        let mut pikachu = combatant(Species::Pikachu);
        pikachu.status = Some(StatusCondition::new(StatusType::Burn));
        assert_eq!(residual_damage(&mut pikachu), Some((StatusType::Burn, 5)));
        pikachu.status = Some(StatusCondition::new(StatusType::Poison));
        assert_eq!(residual_damage(&mut pikachu), Some((StatusType::Poison, 11)));
        pikachu.status = Some(StatusCondition::sleep(2));
        assert_eq!(residual_damage(&mut pikachu), None);
    }

    #[test]
    fn test_weather_immunities() {
        let onix = combatant(Species::Onix);
        let pikachu = combatant(Species::Pikachu);
        assert!(weather_immune(&onix, WeatherKind::Sandstorm));
        assert!(!weather_immune(&pikachu, WeatherKind::Sandstorm));
        assert!(!weather_immune(&onix, WeatherKind::Hail));
        assert!(weather_immune(&pikachu, WeatherKind::Sun));
    }
}
