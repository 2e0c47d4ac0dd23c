use crate::battle::engine::Battle;
use crate::battle::phases::{Phase, StatChangePhase};
use crate::battle::state::{BattleEvent, CombatantRef};
use crate::battle::triggers::{Contribution, TriggerEvent, TriggerPayload, TriggerValue};
use crate::battle::conditions;
use crate::errors::BattleResult;
use schema::{AbilityId, MoveCategory, PokemonType, StatType, WeatherKind};
use tracing::debug;

/// Which trigger events an ability has handlers for.
pub trait AbilityHooks {
    fn listens_to(self, event: TriggerEvent) -> bool;
}

impl AbilityHooks for AbilityId {
    fn listens_to(self, event: TriggerEvent) -> bool {
        use TriggerEvent::*;
        match self {
            AbilityId::NoAbility | AbilityId::NeutralizingGas => false,
            AbilityId::ParentalBond => event == ModifyHitCount,
            AbilityId::Intimidate | AbilityId::Drought => event == Entry,
            AbilityId::SpeedBoost => event == TurnEnd,
            AbilityId::Levitate => event == MoveImmunity,
            AbilityId::HugePower => event == ModifyDamage,
            AbilityId::Unburden => matches!(event, ItemLost | ModifySpeed),
            AbilityId::Moxie => event == Faint,
            AbilityId::Defiant => event == StatStageChanged,
        }
    }
}

const DROUGHT_TURNS: u8 = 5;

fn announce(battle: &mut Battle, owner: CombatantRef, ability: AbilityId) {
    debug!(?owner, ?ability, "ability activated");
    battle.emit(BattleEvent::AbilityActivated {
        combatant: owner,
        ability,
    });
}

fn queue_stat_change(
    battle: &mut Battle,
    target: CombatantRef,
    stat: StatType,
    stages: i8,
    source: CombatantRef,
) {
    battle.queue.unshift(Phase::StatChange(StatChangePhase {
        target,
        stat,
        stages,
        source: Some(source),
    }));
}

pub(crate) fn handle(
    battle: &mut Battle,
    owner: CombatantRef,
    ability: AbilityId,
    event: TriggerEvent,
    payload: &TriggerPayload,
) -> BattleResult<Contribution> {
    match (ability, event, payload) {
        (AbilityId::ParentalBond, TriggerEvent::ModifyHitCount, TriggerPayload::Move(context))
            if context.user == owner =>
        {
            Ok(Contribution::value(TriggerValue::Count(1)))
        }

        (AbilityId::Intimidate, TriggerEvent::Entry, TriggerPayload::Entry(context))
            if context.combatant == owner =>
        {
            let opponents = battle.state.active_on_side(owner.side.opponent());
            if opponents.is_empty() {
                return Ok(Contribution::NONE);
            }
            announce(battle, owner, ability);
            for (_, opponent) in opponents {
                queue_stat_change(battle, opponent, StatType::Atk, -1, owner);
            }
            Ok(Contribution::applied())
        }

        (AbilityId::Drought, TriggerEvent::Entry, TriggerPayload::Entry(context))
            if context.combatant == owner =>
        {
            announce(battle, owner, ability);
            conditions::set_weather(battle, WeatherKind::Sun, DROUGHT_TURNS);
            Ok(Contribution::applied())
        }

        (AbilityId::SpeedBoost, TriggerEvent::TurnEnd, _) => {
            announce(battle, owner, ability);
            queue_stat_change(battle, owner, StatType::Spe, 1, owner);
            Ok(Contribution::applied())
        }

        (AbilityId::Levitate, TriggerEvent::MoveImmunity, TriggerPayload::Move(context))
            if context.target == Some(owner) && context.move_type == PokemonType::Ground =>
        {
            Ok(Contribution::value(TriggerValue::Flag(true)))
        }

        (AbilityId::HugePower, TriggerEvent::ModifyDamage, TriggerPayload::Move(context))
            if context.user == owner && context.category == MoveCategory::Physical =>
        {
            Ok(Contribution::value(TriggerValue::Multiplier(2.0)))
        }

        (AbilityId::Unburden, TriggerEvent::ItemLost, TriggerPayload::ItemLost(context))
            if context.combatant == owner =>
        {
            battle.state.combatant_mut(owner)?.volatile.unburden = true;
            announce(battle, owner, ability);
            Ok(Contribution::applied())
        }

        (AbilityId::Unburden, TriggerEvent::ModifySpeed, TriggerPayload::Speed(context))
            if context.combatant == owner =>
        {
            if battle.state.combatant(owner)?.volatile.unburden {
                Ok(Contribution::value(TriggerValue::Multiplier(2.0)))
            } else {
                Ok(Contribution::NONE)
            }
        }

        (AbilityId::Moxie, TriggerEvent::Faint, TriggerPayload::Faint(context))
            if context.source == Some(owner) && context.fainted.side != owner.side =>
        {
            announce(battle, owner, ability);
            queue_stat_change(battle, owner, StatType::Atk, 1, owner);
            Ok(Contribution::applied())
        }

        (AbilityId::Defiant, TriggerEvent::StatStageChanged, TriggerPayload::StatChange(context))
            if context.target == owner
                && context.delta < 0
                && context.source.is_some_and(|source| source.side != owner.side) =>
        {
            announce(battle, owner, ability);
            queue_stat_change(battle, owner, StatType::Atk, 2, owner);
            Ok(Contribution::applied())
        }

        _ => Ok(Contribution::NONE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppressor_has_no_handlers() {
        for event in [
            TriggerEvent::Entry,
            TriggerEvent::TurnEnd,
            TriggerEvent::ModifyDamage,
            TriggerEvent::Faint,
        ] {
            assert!(!AbilityId::NeutralizingGas.listens_to(event));
        }
    }

    #[test]
    fn test_declared_interests() {
        assert!(AbilityId::ParentalBond.listens_to(TriggerEvent::ModifyHitCount));
        assert!(!AbilityId::ParentalBond.listens_to(TriggerEvent::ModifyDamage));
        assert!(AbilityId::Unburden.listens_to(TriggerEvent::ItemLost));
        assert!(AbilityId::Unburden.listens_to(TriggerEvent::ModifySpeed));
    }
}
