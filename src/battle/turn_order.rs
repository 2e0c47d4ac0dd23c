use crate::battle::commands::{ActionChoice, TurnAction};
use crate::battle::engine::Battle;
use crate::battle::state::{CombatantRef, FieldPosition};
use crate::battle::stats;
use crate::errors::BattleResult;
use std::cmp::Ordering;
use tracing::debug;

/// Sort key for one action. Higher values act first, except `rank`, which is
/// the per-turn tie-break position (lower acts first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPriority {
    pub action_priority: i8, // Flee: 8, Capture/Item: 7, Switch: 6, Move: 0
    pub move_priority: i8,
    pub speed: u32,
    pub rank: usize,
}

impl TurnAction {
    pub fn category_priority(&self) -> i8 {
        match self {
            TurnAction::Flee => 8,
            TurnAction::Capture { .. } | TurnAction::UseItem { .. } => 7,
            TurnAction::Switch { .. } => 6,
            TurnAction::UseMove { .. } => 0,
        }
    }
}

/// Descending by category, move priority and speed; ascending by tie-break rank.
pub fn compare_priority(a: &ActionPriority, b: &ActionPriority) -> Ordering {
    b.action_priority
        .cmp(&a.action_priority)
        .then_with(|| b.move_priority.cmp(&a.move_priority))
        .then_with(|| b.speed.cmp(&a.speed))
        .then_with(|| a.rank.cmp(&b.rank))
}

/// Draws this turn's tie-break ranks: a seeded shuffle of every field slot.
pub(crate) fn roll_tiebreaks(battle: &mut Battle) {
    let mut positions = battle.state.all_positions();
    battle.rng.shuffle(&mut positions, "speed tie-break");
    debug!(?positions, "tie-break order");
    battle.tiebreak = positions;
}

fn tiebreak_rank(battle: &Battle, position: FieldPosition) -> usize {
    battle
        .tiebreak
        .iter()
        .position(|&p| p == position)
        .unwrap_or(usize::MAX)
}

fn order_by_speed(
    battle: &Battle,
    mut entries: Vec<(FieldPosition, CombatantRef, u32)>,
) -> Vec<(FieldPosition, CombatantRef)> {
    entries.sort_by(|a, b| {
        b.2.cmp(&a.2)
            .then_with(|| tiebreak_rank(battle, a.0).cmp(&tiebreak_rank(battle, b.0)))
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.into_iter().map(|(pos, c, _)| (pos, c)).collect()
}

/// Active combatants fastest first, by full effective speed.
pub(crate) fn speed_order(battle: &mut Battle) -> Vec<(FieldPosition, CombatantRef)> {
    let active = battle.state.active_combatants();
    let mut entries = Vec::with_capacity(active.len());
    for (position, combatant) in active {
        let speed = stats::effective_speed(battle, combatant).unwrap_or(0);
        entries.push((position, combatant, speed));
    }
    order_by_speed(battle, entries)
}

/// Like [`speed_order`] but ignores speed triggers.
pub(crate) fn speed_order_without_triggers(battle: &Battle) -> Vec<(FieldPosition, CombatantRef)> {
    let entries = battle
        .state
        .active_combatants()
        .into_iter()
        .map(|(position, combatant)| {
            (
                position,
                combatant,
                stats::untriggered_speed(&battle.state, combatant),
            )
        })
        .collect();
    order_by_speed(battle, entries)
}

fn action_priority(battle: &mut Battle, choice: &ActionChoice) -> BattleResult<ActionPriority> {
    let rank = tiebreak_rank(battle, choice.position);
    let Some(combatant) = battle.state.active_occupant(choice.position) else {
        // Validated already; an empty slot can only sort last.
        return Ok(ActionPriority {
            action_priority: choice.action.category_priority(),
            move_priority: i8::MIN,
            speed: 0,
            rank,
        });
    };
    let move_priority = match choice.action {
        TurnAction::UseMove { move_index, .. } => {
            let slot = battle
                .state
                .combatant(combatant)?
                .move_slot(move_index)
                .map(|slot| slot.move_);
            match slot {
                Some(move_) => battle.dex.move_data(move_)?.priority,
                None => 0,
            }
        }
        _ => 0,
    };
    let speed = stats::effective_speed(battle, combatant)?;
    Ok(ActionPriority {
        action_priority: choice.action.category_priority(),
        move_priority,
        speed,
        rank,
    })
}

/// Orders a turn's validated actions. Computed from scratch every turn.
pub(crate) fn resolve(
    battle: &mut Battle,
    choices: Vec<ActionChoice>,
) -> BattleResult<Vec<ActionChoice>> {
    let mut keyed = Vec::with_capacity(choices.len());
    for choice in choices {
        let priority = action_priority(battle, &choice)?;
        keyed.push((choice, priority));
    }
    keyed.sort_by(|a, b| compare_priority(&a.1, &b.1));
    debug!(
        order = ?keyed.iter().map(|(c, p)| (c.position, *p)).collect::<Vec<_>>(),
        "turn order"
    );
    Ok(keyed.into_iter().map(|(choice, _)| choice).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn priority(action: i8, move_: i8, speed: u32, rank: usize) -> ActionPriority {
        ActionPriority {
            action_priority: action,
            move_priority: move_,
            speed,
            rank,
        }
    }

    #[test]
    fn test_category_beats_speed() {
        let switch = priority(6, 0, 10, 1);
        let fast_move = priority(0, 0, 500, 0);
        assert_eq!(compare_priority(&switch, &fast_move), Ordering::Less);
    }

    #[test]
    fn test_move_priority_beats_speed() {
        let quick = priority(0, 1, 10, 1);
        let fast = priority(0, 0, 500, 0);
        assert_eq!(compare_priority(&quick, &fast), Ordering::Less);
    }

    #[test]
    fn test_rank_breaks_speed_ties() {
        let first = priority(0, 0, 100, 0);
        let second = priority(0, 0, 100, 1);
        assert_eq!(compare_priority(&first, &second), Ordering::Less);
    }

    fn arb_priority() -> impl Strategy<Value = (i8, i8, u32)> {
        (
            prop_oneof![Just(0i8), Just(6), Just(7), Just(8)],
            -7i8..=5,
            0u32..50,
        )
    }

    proptest! {
        #[test]
        fn prop_sorted_order_is_consistent(raw in prop::collection::vec(arb_priority(), 1..8)) {
            let mut keys: Vec<ActionPriority> = raw
                .into_iter()
                .enumerate()
                .map(|(rank, (a, m, s))| priority(a, m, s, rank))
                .collect();
            keys.sort_by(compare_priority);
            for pair in keys.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                let key_a = (a.action_priority, a.move_priority, a.speed);
                let key_b = (b.action_priority, b.move_priority, b.speed);
                prop_assert!(key_a >= key_b);
                if key_a == key_b {
                    prop_assert!(a.rank < b.rank);
                }
                // Distinct ranks make the order total: no two keys compare equal.
                prop_assert_ne!(compare_priority(a, b), Ordering::Equal);
            }
        }
    }
}
