//! The command surface: one action per active combatant per turn.
//!
//! Selections are validated as a whole before anything is queued. A rejected
//! turn leaves the battle untouched so the caller can prompt again.

use crate::battle::engine::Battle;
use crate::battle::phases::{
    CapturePhase, FleePhase, MovePhase, Phase, SwitchPhase, UseItemPhase,
};
use crate::battle::state::{BattleState, Controller, FieldPosition, SideId};
use crate::battle::switching::{self, ReplacementChoice};
use crate::errors::CommandRejection;
use schema::{BagItem, BattleKind, MoveTarget, Pokeball};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAction {
    UseMove {
        move_index: usize,
        /// Required for single-target moves when more than one opponent stands.
        target: Option<FieldPosition>,
    },
    Switch {
        party_index: usize,
    },
    UseItem {
        item: BagItem,
        party_index: usize,
    },
    Capture {
        ball: Pokeball,
        target: FieldPosition,
    },
    Flee,
}

/// The action chosen for the combatant standing at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionChoice {
    pub position: FieldPosition,
    pub action: TurnAction,
}

impl ActionChoice {
    pub fn new(position: FieldPosition, action: TurnAction) -> Self {
        Self { position, action }
    }
}

fn validate_move(
    battle: &Battle,
    position: FieldPosition,
    move_index: usize,
    target: Option<FieldPosition>,
) -> Result<(), CommandRejection> {
    let state = &battle.state;
    let user = state
        .active_occupant(position)
        .ok_or(CommandRejection::NoActiveCombatant(position))?;
    let slot = state
        .combatant(user)
        .map_err(|_| CommandRejection::NoActiveCombatant(position))?
        .move_slot(move_index)
        .ok_or(CommandRejection::InvalidMoveSlot(move_index))?;
    if slot.pp == 0 {
        return Err(CommandRejection::NoPpRemaining(slot.move_));
    }
    let data = battle
        .dex
        .move_data(slot.move_)
        .map_err(|_| CommandRejection::InvalidMoveSlot(move_index))?;

    if data.target != MoveTarget::SingleOpponent {
        return Ok(());
    }
    let opponents = state.active_on_side(position.side.opponent());
    match target {
        Some(chosen) => {
            if opponents.iter().any(|(pos, _)| *pos == chosen) {
                Ok(())
            } else {
                Err(CommandRejection::IllegalTarget(chosen))
            }
        }
        None if opponents.len() > 1 => Err(CommandRejection::TargetRequired(slot.move_)),
        None => Ok(()),
    }
}

fn validate_action(
    battle: &Battle,
    choice: &ActionChoice,
    incoming: &mut BTreeSet<(SideId, usize)>,
) -> Result<(), CommandRejection> {
    let state = &battle.state;
    let side = state.side(choice.position.side);
    let is_player = side.id == SideId::Player;

    match choice.action {
        TurnAction::UseMove { move_index, target } => {
            validate_move(battle, choice.position, move_index, target)
        }
        TurnAction::Switch { party_index } => {
            if side.controller == Controller::Wild || !side.bench().contains(&party_index) {
                return Err(CommandRejection::InvalidSwitchTarget(party_index));
            }
            if !incoming.insert((side.id, party_index)) {
                return Err(CommandRejection::SwitchTargetTaken(party_index));
            }
            Ok(())
        }
        TurnAction::UseItem { party_index, .. } => {
            if !is_player {
                return Err(CommandRejection::PlayerOnly("use bag items"));
            }
            match side.roster.get(party_index) {
                Some(member) if member.is_available() => Ok(()),
                _ => Err(CommandRejection::InvalidItemTarget(party_index)),
            }
        }
        TurnAction::Capture { target, .. } => {
            if !is_player {
                return Err(CommandRejection::PlayerOnly("throw a ball"));
            }
            if state.kind != BattleKind::Wild {
                return Err(CommandRejection::CaptureNotAllowed);
            }
            if target.side != SideId::Enemy || state.active_occupant(target).is_none() {
                return Err(CommandRejection::IllegalTarget(target));
            }
            Ok(())
        }
        TurnAction::Flee => {
            if !is_player {
                return Err(CommandRejection::PlayerOnly("flee"));
            }
            if state.kind != BattleKind::Wild {
                return Err(CommandRejection::FleeNotAllowed);
            }
            Ok(())
        }
    }
}

/// Checks a full turn selection: exactly one legal action per active combatant.
pub fn validate_turn(battle: &Battle, choices: &[ActionChoice]) -> Result<(), CommandRejection> {
    let mut seen = BTreeSet::new();
    let mut incoming = BTreeSet::new();
    for choice in choices {
        if battle.state.active_occupant(choice.position).is_none() {
            return Err(CommandRejection::NoActiveCombatant(choice.position));
        }
        if !seen.insert(choice.position) {
            return Err(CommandRejection::DuplicateCommand(choice.position));
        }
        validate_action(battle, choice, &mut incoming)?;
    }
    for (position, _) in battle.state.active_combatants() {
        if !seen.contains(&position) {
            return Err(CommandRejection::MissingCommand(position));
        }
    }
    Ok(())
}

/// Checks replacement choices against the slots that are waiting for one.
pub fn validate_replacements(
    state: &BattleState,
    choices: &[ReplacementChoice],
) -> Result<(), CommandRejection> {
    let required = switching::vacancies(state);
    let mut filled = BTreeSet::new();
    let mut incoming = BTreeSet::new();
    for choice in choices {
        if !required.contains(&choice.position) {
            return Err(CommandRejection::IllegalTarget(choice.position));
        }
        if !filled.insert(choice.position) {
            return Err(CommandRejection::DuplicateCommand(choice.position));
        }
        let side = state.side(choice.position.side);
        if !side.bench().contains(&choice.party_index) {
            return Err(CommandRejection::InvalidSwitchTarget(choice.party_index));
        }
        if !incoming.insert((side.id, choice.party_index)) {
            return Err(CommandRejection::SwitchTargetTaken(choice.party_index));
        }
    }
    if let Some(missing) = required.iter().find(|pos| !filled.contains(*pos)) {
        return Err(CommandRejection::MissingCommand(*missing));
    }
    Ok(())
}

/// Every legal action for the combatant at `position`, for prompts and AI.
///
/// Bag items are left out: what is in the bag is not the battle's concern.
pub fn valid_actions(battle: &Battle, position: FieldPosition) -> Vec<TurnAction> {
    let state = &battle.state;
    let Some(user) = state.active_occupant(position) else {
        return Vec::new();
    };
    let mut actions = Vec::new();
    let opponents = state.active_on_side(position.side.opponent());

    if let Ok(combatant) = state.combatant(user) {
        for (move_index, slot) in combatant.moves.iter().enumerate() {
            if slot.pp == 0 {
                continue;
            }
            let single = battle
                .dex
                .move_data(slot.move_)
                .is_ok_and(|data| data.target == MoveTarget::SingleOpponent);
            if single && opponents.len() > 1 {
                for &(target, _) in &opponents {
                    actions.push(TurnAction::UseMove {
                        move_index,
                        target: Some(target),
                    });
                }
            } else {
                actions.push(TurnAction::UseMove {
                    move_index,
                    target: None,
                });
            }
        }
    }

    let side = state.side(position.side);
    if side.controller != Controller::Wild {
        actions.extend(
            side.bench()
                .into_iter()
                .map(|party_index| TurnAction::Switch { party_index }),
        );
    }
    if side.id == SideId::Player && state.kind == BattleKind::Wild {
        for &(target, _) in &opponents {
            actions.push(TurnAction::Capture {
                ball: Pokeball::PokeBall,
                target,
            });
        }
        actions.push(TurnAction::Flee);
    }
    actions
}

/// The phase that carries out a validated action.
pub(crate) fn to_phase(state: &BattleState, choice: &ActionChoice) -> Option<Phase> {
    let occupant = state.active_occupant(choice.position)?;
    let phase = match choice.action {
        TurnAction::UseMove { move_index, target } => Phase::Move(MovePhase {
            user: occupant,
            move_index,
            target,
        }),
        TurnAction::Switch { party_index } => Phase::Switch(SwitchPhase {
            position: choice.position,
            outgoing: occupant,
            party_index,
        }),
        TurnAction::UseItem { item, party_index } => Phase::UseItem(UseItemPhase {
            user: choice.position,
            item,
            party_index,
        }),
        TurnAction::Capture { ball, target } => Phase::AttemptCapture(CapturePhase {
            thrower: choice.position,
            target,
            ball,
        }),
        TurnAction::Flee => Phase::AttemptFlee(FleePhase {
            position: choice.position,
        }),
    };
    Some(phase)
}
