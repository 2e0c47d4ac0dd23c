use crate::battle::conditions;
use crate::battle::engine::Battle;
use crate::battle::state::{BattleEvent, CombatantRef, SideId};
use crate::battle::triggers::{
    self, Contribution, ItemLostContext, TriggerEvent, TriggerPayload, TriggerValue,
};
use crate::errors::{BattleError, BattleResult};
use schema::{HeldItem, MoveCategory};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    Held(HeldItem),
    /// Side-owned; the stack count is the number of turns left.
    Tailwind,
}

impl ModifierKind {
    pub fn listens_to(self, event: TriggerEvent) -> bool {
        use TriggerEvent::*;
        match self {
            ModifierKind::Held(HeldItem::Leftovers) => event == TurnEnd,
            ModifierKind::Held(HeldItem::ChoiceBand) => event == ModifyDamage,
            ModifierKind::Held(HeldItem::MultiLens) => event == ModifyHitCount,
            ModifierKind::Held(HeldItem::SitrusBerry) => event == DamageTaken,
            ModifierKind::Tailwind => matches!(event, ModifySpeed | TurnEnd),
        }
    }

    /// Higher fires first among one owner's modifiers.
    pub fn default_priority(self) -> i8 {
        match self {
            ModifierKind::Held(HeldItem::SitrusBerry) => 1,
            _ => 0,
        }
    }

    pub fn max_stacks(self) -> u8 {
        match self {
            ModifierKind::Held(HeldItem::Leftovers) => 4,
            ModifierKind::Held(HeldItem::MultiLens) => 2,
            ModifierKind::Held(_) => 1,
            ModifierKind::Tailwind => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOwner {
    Combatant(CombatantRef),
    Side(SideId),
}

/// A stackable passive effect held by a combatant or owned by a side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub owner: ModifierOwner,
    pub stacks: u8,
    pub priority: i8,
    /// Battle-wide acquisition sequence; also identifies the modifier.
    pub acquired: u64,
}

impl Modifier {
    pub fn new(kind: ModifierKind, owner: ModifierOwner, acquired: u64) -> Self {
        Self {
            kind,
            owner,
            stacks: 1,
            priority: kind.default_priority(),
            acquired,
        }
    }

    pub fn with_stacks(mut self, stacks: u8) -> Self {
        self.stacks = stacks.min(self.kind.max_stacks());
        self
    }
}

/// Priority descending, then acquisition order.
pub fn firing_order(a: &Modifier, b: &Modifier) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.acquired.cmp(&b.acquired))
}

fn owner_combatant(modifier: &Modifier) -> BattleResult<CombatantRef> {
    match modifier.owner {
        ModifierOwner::Combatant(owner) => Ok(owner),
        ModifierOwner::Side(_) => Err(BattleError::Handler(format!(
            "{:?} must be held by a combatant",
            modifier.kind
        ))),
    }
}

/// Is this exact modifier still attached to its owner?
fn still_held(battle: &Battle, modifier: &Modifier) -> bool {
    match modifier.owner {
        ModifierOwner::Combatant(owner) => battle
            .state
            .combatant(owner)
            .map(|c| c.modifiers.iter().any(|m| m.acquired == modifier.acquired))
            .unwrap_or(false),
        ModifierOwner::Side(side) => battle
            .state
            .side(side)
            .modifiers
            .iter()
            .any(|m| m.acquired == modifier.acquired),
    }
}

pub(crate) fn handle(
    battle: &mut Battle,
    modifier: &Modifier,
    event: TriggerEvent,
    payload: &TriggerPayload,
) -> BattleResult<Contribution> {
    if !still_held(battle, modifier) {
        // Consumed earlier in this publish.
        return Ok(Contribution::NONE);
    }

    match (modifier.kind, event, payload) {
        (ModifierKind::Held(HeldItem::Leftovers), TriggerEvent::TurnEnd, _) => {
            let owner = owner_combatant(modifier)?;
            let combatant = battle.state.combatant(owner)?;
            if combatant.current_hp() >= combatant.max_hp() {
                return Ok(Contribution::NONE);
            }
            let amount = (combatant.max_hp() / 16).max(1) * u16::from(modifier.stacks);
            battle.emit(BattleEvent::ItemActivated {
                combatant: owner,
                item: HeldItem::Leftovers,
            });
            conditions::heal(battle, owner, amount)?;
            Ok(Contribution::applied())
        }

        (
            ModifierKind::Held(HeldItem::ChoiceBand),
            TriggerEvent::ModifyDamage,
            TriggerPayload::Move(context),
        ) => {
            let owner = owner_combatant(modifier)?;
            if context.user == owner && context.category == MoveCategory::Physical {
                Ok(Contribution::value(TriggerValue::Multiplier(1.5)))
            } else {
                Ok(Contribution::NONE)
            }
        }

        (
            ModifierKind::Held(HeldItem::MultiLens),
            TriggerEvent::ModifyHitCount,
            TriggerPayload::Move(context),
        ) => {
            let owner = owner_combatant(modifier)?;
            if context.user == owner {
                Ok(Contribution::value(TriggerValue::Count(i32::from(
                    modifier.stacks,
                ))))
            } else {
                Ok(Contribution::NONE)
            }
        }

        (
            ModifierKind::Held(HeldItem::SitrusBerry),
            TriggerEvent::DamageTaken,
            TriggerPayload::Damage(context),
        ) => {
            let owner = owner_combatant(modifier)?;
            if context.target != owner {
                return Ok(Contribution::NONE);
            }
            let combatant = battle.state.combatant(owner)?;
            let (hp, max) = (combatant.current_hp(), combatant.max_hp());
            if hp == 0 || hp > max / 2 {
                return Ok(Contribution::NONE);
            }
            consume_item(battle, owner, modifier)?;
            conditions::heal(battle, owner, (max / 4).max(1))?;
            Ok(Contribution::applied())
        }

        (ModifierKind::Tailwind, TriggerEvent::ModifySpeed, TriggerPayload::Speed(context)) => {
            match modifier.owner {
                ModifierOwner::Side(side) if context.combatant.side == side => {
                    Ok(Contribution::value(TriggerValue::Multiplier(2.0)))
                }
                _ => Ok(Contribution::NONE),
            }
        }

        (ModifierKind::Tailwind, TriggerEvent::TurnEnd, _) => {
            let ModifierOwner::Side(side) = modifier.owner else {
                return Ok(Contribution::NONE);
            };
            let owned = &mut battle.state.side_mut(side).modifiers;
            if let Some(entry) = owned.iter_mut().find(|m| m.acquired == modifier.acquired) {
                entry.stacks = entry.stacks.saturating_sub(1);
            }
            let before = owned.len();
            owned.retain(|m| m.stacks > 0);
            if owned.len() < before {
                battle.emit(BattleEvent::SideModifierEnded {
                    side,
                    kind: ModifierKind::Tailwind,
                });
            }
            Ok(Contribution::applied())
        }

        _ => Ok(Contribution::NONE),
    }
}

/// Removes a held item from its owner and announces the loss.
pub(crate) fn consume_item(
    battle: &mut Battle,
    owner: CombatantRef,
    modifier: &Modifier,
) -> BattleResult<()> {
    let ModifierKind::Held(item) = modifier.kind else {
        return Ok(());
    };
    battle
        .state
        .combatant_mut(owner)?
        .modifiers
        .retain(|m| m.acquired != modifier.acquired);
    debug!(?owner, ?item, "item consumed");
    battle.emit(BattleEvent::ItemConsumed {
        combatant: owner,
        item,
    });
    triggers::publish(
        battle,
        TriggerEvent::ItemLost,
        &TriggerPayload::ItemLost(ItemLostContext {
            combatant: owner,
            item,
        }),
    );
    Ok(())
}

/// Starts a side modifier, or refreshes it if already present.
pub(crate) fn add_side_modifier(
    battle: &mut Battle,
    side: SideId,
    kind: ModifierKind,
    stacks: u8,
) -> bool {
    if let Some(existing) = battle
        .state
        .side_mut(side)
        .modifiers
        .iter_mut()
        .find(|m| m.kind == kind)
    {
        existing.stacks = stacks.min(kind.max_stacks());
        return false;
    }
    let acquired = battle.state.next_modifier_seq();
    let modifier = Modifier::new(kind, ModifierOwner::Side(side), acquired).with_stacks(stacks);
    battle.state.side_mut(side).modifiers.push(modifier);
    battle.emit(BattleEvent::SideModifierStarted { side, kind });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firing_order_uses_priority_then_acquisition() {
        let owner = ModifierOwner::Combatant(CombatantRef::new(SideId::Player, 0));
        let leftovers = Modifier::new(ModifierKind::Held(HeldItem::Leftovers), owner, 1);
        let band = Modifier::new(ModifierKind::Held(HeldItem::ChoiceBand), owner, 2);
        let berry = Modifier::new(ModifierKind::Held(HeldItem::SitrusBerry), owner, 3);
        let mut all = vec![band.clone(), berry.clone(), leftovers.clone()];
        all.sort_by(firing_order);
        assert_eq!(all, vec![berry, leftovers, band]);
    }

    #[test]
    fn test_stacks_are_capped() {
        let owner = ModifierOwner::Side(SideId::Enemy);
        let tailwind = Modifier::new(ModifierKind::Tailwind, owner, 1).with_stacks(200);
        assert_eq!(tailwind.stacks, ModifierKind::Tailwind.max_stacks());
    }
}
