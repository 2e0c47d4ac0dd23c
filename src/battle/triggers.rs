// The trigger bus: abilities and modifiers react to named battle events.
//
// A publish collects every eligible listener for the event, runs them in a
// fixed order and folds their contributions into one accumulator using the
// event's fold rule. Handlers may also queue follow-up phases on the battle.

use crate::battle::abilities::{self, AbilityHooks};
use crate::battle::engine::Battle;
use crate::battle::modifiers::{self, Modifier, ModifierOwner};
use crate::battle::state::{CombatantRef, FieldPosition, SideId};
use crate::battle::turn_order;
use crate::errors::BattleResult;
use schema::{AbilityId, HeldItem, Move, MoveCategory, PokemonType, StatType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TriggerEvent {
    /// A combatant was placed into a slot.
    Entry,
    /// A move is about to be used. Any `true` prevents it.
    PreMove,
    /// Extra strikes for an eligible move. Contributions add.
    ModifyHitCount,
    /// Damage multiplier from abilities and items. Contributions multiply.
    ModifyDamage,
    /// Any `true` makes the target immune to this move.
    MoveImmunity,
    /// Speed multiplier. Contributions multiply.
    ModifySpeed,
    /// Once per move use, after every strike.
    PostMoveAllHits,
    DamageTaken,
    TurnEnd,
    StatStageChanged,
    ItemLost,
    Faint,
}

/// How contributions to one publish combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldRule {
    AnyTrue,
    Product,
    Sum,
    /// Handlers act through side effects only.
    Notify,
}

impl TriggerEvent {
    pub fn fold_rule(self) -> FoldRule {
        match self {
            TriggerEvent::PreMove | TriggerEvent::MoveImmunity => FoldRule::AnyTrue,
            TriggerEvent::ModifyDamage | TriggerEvent::ModifySpeed => FoldRule::Product,
            TriggerEvent::ModifyHitCount => FoldRule::Sum,
            _ => FoldRule::Notify,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerValue {
    Flag(bool),
    Multiplier(f64),
    Count(i32),
    Unit,
}

impl TriggerValue {
    pub fn initial(rule: FoldRule) -> Self {
        match rule {
            FoldRule::AnyTrue => TriggerValue::Flag(false),
            FoldRule::Product => TriggerValue::Multiplier(1.0),
            FoldRule::Sum => TriggerValue::Count(0),
            FoldRule::Notify => TriggerValue::Unit,
        }
    }

    fn combine(&mut self, contribution: TriggerValue) {
        match (self, contribution) {
            (TriggerValue::Flag(acc), TriggerValue::Flag(value)) => *acc |= value,
            (TriggerValue::Multiplier(acc), TriggerValue::Multiplier(value)) => *acc *= value,
            (TriggerValue::Count(acc), TriggerValue::Count(value)) => *acc += value,
            (acc, value) => {
                warn!(?acc, ?value, "mismatched trigger contribution ignored");
            }
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, PartialEq)]
pub struct EntryContext {
    pub combatant: CombatantRef,
    pub position: FieldPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveContext {
    pub user: CombatantRef,
    pub target: Option<CombatantRef>,
    pub move_used: Move,
    pub move_type: PokemonType,
    pub category: MoveCategory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedContext {
    pub combatant: CombatantRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageContext {
    pub target: CombatantRef,
    pub source: Option<CombatantRef>,
    pub amount: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatChangeContext {
    pub target: CombatantRef,
    pub stat: StatType,
    pub delta: i8,
    pub source: Option<CombatantRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemLostContext {
    pub combatant: CombatantRef,
    pub item: HeldItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaintContext {
    pub fainted: CombatantRef,
    pub source: Option<CombatantRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerPayload {
    Entry(EntryContext),
    Move(MoveContext),
    Speed(SpeedContext),
    Damage(DamageContext),
    StatChange(StatChangeContext),
    ItemLost(ItemLostContext),
    Faint(FaintContext),
    TurnEnd,
}

// --- HANDLER RESULTS ---

/// What a single handler produced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Contribution {
    pub value: Option<TriggerValue>,
    pub applied: bool,
}

impl Contribution {
    pub const NONE: Contribution = Contribution {
        value: None,
        applied: false,
    };

    pub fn applied() -> Self {
        Self {
            value: None,
            applied: true,
        }
    }

    pub fn value(value: TriggerValue) -> Self {
        Self {
            value: Some(value),
            applied: true,
        }
    }
}

/// The folded result of one publish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Publication {
    pub value: TriggerValue,
    /// True if any handler reported that it applied.
    pub applied: bool,
    pub handlers_run: usize,
}

impl Publication {
    fn blocked(event: TriggerEvent) -> Self {
        Self {
            value: TriggerValue::initial(event.fold_rule()),
            applied: false,
            handlers_run: 0,
        }
    }

    pub fn flag(&self) -> bool {
        matches!(self.value, TriggerValue::Flag(true))
    }

    pub fn multiplier(&self) -> f64 {
        match self.value {
            TriggerValue::Multiplier(value) => value,
            _ => 1.0,
        }
    }

    pub fn count(&self) -> i32 {
        match self.value {
            TriggerValue::Count(value) => value,
            _ => 0,
        }
    }
}

// --- LISTENERS ---

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Listener {
    Ability {
        owner: CombatantRef,
        ability: AbilityId,
    },
    Modifier(Modifier),
}

/// Per-event in-progress flags guarding against re-entrant publishes.
#[derive(Debug, Clone, Default)]
pub struct TriggerGuard {
    in_progress: BTreeSet<TriggerEvent>,
}

impl TriggerGuard {
    pub(crate) fn enter(&mut self, event: TriggerEvent) -> bool {
        self.in_progress.insert(event)
    }

    pub(crate) fn exit(&mut self, event: TriggerEvent) {
        self.in_progress.remove(&event);
    }

    pub fn is_publishing(&self, event: TriggerEvent) -> bool {
        self.in_progress.contains(&event)
    }
}

/// Eligible listeners for `event`, in firing order.
///
/// Abilities of on-field combatants come first in speed order, then each
/// on-field combatant's modifiers (priority, then acquisition order), then
/// side-owned modifiers. Ability suppression is evaluated here, on every call.
pub(crate) fn listeners(battle: &mut Battle, event: TriggerEvent) -> Vec<Listener> {
    let order: Vec<CombatantRef> = if event == TriggerEvent::ModifySpeed {
        // Speed order itself depends on this event.
        turn_order::speed_order_without_triggers(battle)
    } else {
        turn_order::speed_order(battle)
    }
    .into_iter()
    .map(|(_, combatant)| combatant)
    .collect();

    let mut found = Vec::new();
    for &owner in &order {
        if let Some(ability) = battle.state.effective_ability(owner) {
            if ability.listens_to(event) {
                found.push(Listener::Ability { owner, ability });
            }
        }
    }
    for &owner in &order {
        let Ok(combatant) = battle.state.combatant(owner) else {
            continue;
        };
        let mut held: Vec<Modifier> = combatant
            .modifiers
            .iter()
            .filter(|modifier| modifier.kind.listens_to(event))
            .cloned()
            .collect();
        held.sort_by(modifiers::firing_order);
        found.extend(held.into_iter().map(Listener::Modifier));
    }
    for side in SideId::BOTH {
        let mut owned: Vec<Modifier> = battle
            .state
            .side(side)
            .modifiers
            .iter()
            .filter(|modifier| modifier.kind.listens_to(event))
            .cloned()
            .collect();
        owned.sort_by(modifiers::firing_order);
        found.extend(owned.into_iter().map(Listener::Modifier));
    }
    found
}

fn still_eligible(battle: &Battle, listener: &Listener) -> bool {
    match listener {
        Listener::Ability { owner, ability } => {
            battle.state.is_active(*owner)
                && battle.state.effective_ability(*owner) == Some(*ability)
        }
        Listener::Modifier(modifier) => match modifier.owner {
            ModifierOwner::Combatant(owner) => battle.state.is_active(owner),
            ModifierOwner::Side(_) => true,
        },
    }
}

/// Runs every eligible listener for `event` and folds their contributions.
///
/// A handler that fails is logged and skipped; the rest still run. Publishing
/// an event from inside one of its own handlers is refused.
pub fn publish(battle: &mut Battle, event: TriggerEvent, payload: &TriggerPayload) -> Publication {
    if !battle.triggers.enter(event) {
        warn!(?event, "re-entrant publish refused");
        return Publication::blocked(event);
    }

    let listeners = listeners(battle, event);
    let mut value = TriggerValue::initial(event.fold_rule());
    let mut applied = false;
    let mut handlers_run = 0;

    for listener in listeners {
        // Earlier handlers may have removed this owner from the field.
        if !still_eligible(battle, &listener) {
            continue;
        }
        handlers_run += 1;
        let result: BattleResult<Contribution> = match &listener {
            Listener::Ability { owner, ability } => {
                abilities::handle(battle, *owner, *ability, event, payload)
            }
            Listener::Modifier(modifier) => modifiers::handle(battle, modifier, event, payload),
        };
        match result {
            Ok(contribution) => {
                if let Some(contributed) = contribution.value {
                    value.combine(contributed);
                }
                applied |= contribution.applied;
            }
            Err(err) => {
                warn!(?event, ?listener, error = %err, "trigger handler failed; skipping");
            }
        }
    }

    battle.triggers.exit(event);
    trace!(?event, ?value, applied, handlers_run, "published");
    Publication {
        value,
        applied,
        handlers_run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_rules() {
        let mut flag = TriggerValue::initial(FoldRule::AnyTrue);
        flag.combine(TriggerValue::Flag(false));
        flag.combine(TriggerValue::Flag(true));
        flag.combine(TriggerValue::Flag(false));
        assert_eq!(flag, TriggerValue::Flag(true));

        let mut product = TriggerValue::initial(FoldRule::Product);
        product.combine(TriggerValue::Multiplier(2.0));
        product.combine(TriggerValue::Multiplier(1.5));
        assert_eq!(product, TriggerValue::Multiplier(3.0));

        let mut sum = TriggerValue::initial(FoldRule::Sum);
        sum.combine(TriggerValue::Count(1));
        sum.combine(TriggerValue::Count(2));
        assert_eq!(sum, TriggerValue::Count(3));
    }

    #[test]
    fn test_mismatched_contribution_is_ignored() {
        let mut sum = TriggerValue::initial(FoldRule::Sum);
        sum.combine(TriggerValue::Multiplier(9.0));
        assert_eq!(sum, TriggerValue::Count(0));
    }

    #[test]
    fn test_guard_blocks_nested_entry() {
        let mut guard = TriggerGuard::default();
        assert!(guard.enter(TriggerEvent::TurnEnd));
        assert!(!guard.enter(TriggerEvent::TurnEnd));
        assert!(guard.enter(TriggerEvent::ModifySpeed));
        guard.exit(TriggerEvent::TurnEnd);
        assert!(!guard.is_publishing(TriggerEvent::TurnEnd));
        assert!(guard.is_publishing(TriggerEvent::ModifySpeed));
    }
}
