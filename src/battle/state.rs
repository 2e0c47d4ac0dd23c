use crate::battle::modifiers::{Modifier, ModifierKind, ModifierOwner};
use crate::battle::positional_tags::PositionalTagManager;
use crate::errors::{BattleError, BattleResult, DeclineReason};
use crate::pokemon::Combatant;
use schema::{
    AbilityId, BagItem, BattleFormat, BattleKind, HeldItem, Move, Pokeball, StatType, StatusType,
    WeatherKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- POSITIONS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SideId {
    Player,
    Enemy,
}

impl SideId {
    pub const BOTH: [SideId; 2] = [SideId::Player, SideId::Enemy];

    pub const fn index(self) -> usize {
        match self {
            SideId::Player => 0,
            SideId::Enemy => 1,
        }
    }

    pub const fn opponent(self) -> SideId {
        match self {
            SideId::Player => SideId::Enemy,
            SideId::Enemy => SideId::Player,
        }
    }
}

/// A field slot. Positional tags bind to these, never to combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPosition {
    pub side: SideId,
    pub slot: usize,
}

impl FieldPosition {
    pub const fn new(side: SideId, slot: usize) -> Self {
        Self { side, slot }
    }
}

/// Stable identity of a combatant: its side and roster index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantRef {
    pub side: SideId,
    pub party_index: usize,
}

impl CombatantRef {
    pub const fn new(side: SideId, party_index: usize) -> Self {
        Self { side, party_index }
    }
}

// --- SIDES & ARENA ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    Player,
    Trainer,
    Wild,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub id: SideId,
    pub name: String,
    pub controller: Controller,
    pub roster: Vec<Combatant>,
    /// Occupant roster index per field slot.
    pub field: Vec<Option<usize>>,
    /// Side-owned modifiers in acquisition order.
    pub modifiers: Vec<Modifier>,
    pub spikes: u8,
}

impl Side {
    pub fn new(
        id: SideId,
        name: impl Into<String>,
        controller: Controller,
        mut roster: Vec<Combatant>,
    ) -> Self {
        for (index, combatant) in roster.iter_mut().enumerate() {
            combatant.side = id;
            combatant.field_slot = None;
            for modifier in combatant.modifiers.iter_mut() {
                modifier.owner = ModifierOwner::Combatant(CombatantRef::new(id, index));
            }
        }
        Self {
            id,
            name: name.into(),
            controller,
            roster,
            field: Vec::new(),
            modifiers: Vec::new(),
            spikes: 0,
        }
    }

    /// Roster indices that could be sent in right now.
    pub fn bench(&self) -> Vec<usize> {
        self.roster
            .iter()
            .enumerate()
            .filter(|(_, c)| c.field_slot.is_none() && c.is_available())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_available(&self) -> bool {
        self.roster.iter().any(Combatant::is_available)
    }

    pub fn side_modifier_stacks(&self, kind: ModifierKind) -> u8 {
        self.modifiers
            .iter()
            .filter(|modifier| modifier.kind == kind)
            .map(|modifier| modifier.stacks)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weather {
    pub kind: WeatherKind,
    pub turns_remaining: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    pub weather: Option<Weather>,
}

impl Arena {
    pub fn weather_kind(&self) -> Option<WeatherKind> {
        self.weather.map(|weather| weather.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    Victory(SideId),
    Draw,
    Captured,
    Fled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleStatus {
    InProgress,
    Ended(BattleOutcome),
}

// --- BATTLE STATE ---

/// Everything about a battle that survives a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub battle_id: String,
    pub format: BattleFormat,
    pub kind: BattleKind,
    pub turn: u32,
    pub sides: [Side; 2],
    pub arena: Arena,
    pub positional_tags: PositionalTagManager,
    pub status: BattleStatus,
    pub flee_attempts: u8,
    pub next_modifier_seq: u64,
}

impl BattleState {
    pub fn new(
        id: impl Into<String>,
        format: BattleFormat,
        kind: BattleKind,
        player: Side,
        enemy: Side,
    ) -> Self {
        let slots = format.slots();
        let mut sides = [player, enemy];
        for side in sides.iter_mut() {
            side.field = vec![None; slots];
        }
        let mut state = Self {
            battle_id: id.into(),
            format,
            kind,
            turn: 1,
            sides,
            arena: Arena::default(),
            positional_tags: PositionalTagManager::default(),
            status: BattleStatus::InProgress,
            flee_attempts: 0,
            next_modifier_seq: 0,
        };
        // Held items are acquired in roster order before the battle starts.
        for side in SideId::BOTH {
            let count = state.side(side).roster.len();
            for index in 0..count {
                let modifiers = state.side(side).roster[index].modifiers.len();
                for m in 0..modifiers {
                    let seq = state.next_modifier_seq();
                    state.side_mut(side).roster[index].modifiers[m].acquired = seq;
                }
            }
        }
        state
    }

    pub fn next_modifier_seq(&mut self) -> u64 {
        self.next_modifier_seq += 1;
        self.next_modifier_seq
    }

    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id.index()]
    }

    pub fn side_mut(&mut self, id: SideId) -> &mut Side {
        &mut self.sides[id.index()]
    }

    pub fn combatant(&self, target: CombatantRef) -> BattleResult<&Combatant> {
        self.side(target.side)
            .roster
            .get(target.party_index)
            .ok_or(BattleError::InvalidCombatant(target))
    }

    pub fn combatant_mut(&mut self, target: CombatantRef) -> BattleResult<&mut Combatant> {
        self.side_mut(target.side)
            .roster
            .get_mut(target.party_index)
            .ok_or(BattleError::InvalidCombatant(target))
    }

    pub fn is_valid_position(&self, position: FieldPosition) -> bool {
        position.slot < self.side(position.side).field.len()
    }

    /// Whoever stands in a slot, fainted or not.
    pub fn occupant(&self, position: FieldPosition) -> Option<CombatantRef> {
        self.side(position.side)
            .field
            .get(position.slot)
            .copied()
            .flatten()
            .map(|index| CombatantRef::new(position.side, index))
    }

    /// The occupant of a slot if it can still act or be targeted.
    pub fn active_occupant(&self, position: FieldPosition) -> Option<CombatantRef> {
        self.occupant(position).filter(|&c| self.is_active(c))
    }

    pub fn position_of(&self, combatant: CombatantRef) -> Option<FieldPosition> {
        self.combatant(combatant)
            .ok()
            .and_then(|c| c.field_slot)
            .map(|slot| FieldPosition::new(combatant.side, slot))
    }

    /// On the field and not fainted.
    pub fn is_active(&self, combatant: CombatantRef) -> bool {
        self.combatant(combatant)
            .map(|c| c.field_slot.is_some() && !c.is_fainted())
            .unwrap_or(false)
    }

    pub fn all_positions(&self) -> Vec<FieldPosition> {
        SideId::BOTH
            .iter()
            .flat_map(|&side| {
                (0..self.side(side).field.len()).map(move |slot| FieldPosition::new(side, slot))
            })
            .collect()
    }

    /// Every active combatant with its slot, player side first.
    pub fn active_combatants(&self) -> Vec<(FieldPosition, CombatantRef)> {
        self.all_positions()
            .into_iter()
            .filter_map(|pos| self.active_occupant(pos).map(|c| (pos, c)))
            .collect()
    }

    pub fn active_on_side(&self, side: SideId) -> Vec<(FieldPosition, CombatantRef)> {
        self.active_combatants()
            .into_iter()
            .filter(|(pos, _)| pos.side == side)
            .collect()
    }

    /// Abilities are globally suppressed while a suppressor stands on the field.
    pub fn abilities_suppressed(&self) -> bool {
        self.active_combatants().iter().any(|&(_, c)| {
            self.combatant(c)
                .map(|c| c.ability == AbilityId::NeutralizingGas)
                .unwrap_or(false)
        })
    }

    /// The ability that currently has effect, if any.
    pub fn effective_ability(&self, combatant: CombatantRef) -> Option<AbilityId> {
        let ability = self.combatant(combatant).ok()?.ability;
        if ability == AbilityId::NoAbility {
            return None;
        }
        if self.abilities_suppressed() && !ability.ignores_suppression() {
            return None;
        }
        Some(ability)
    }

    /// Works out whether the battle is over.
    pub fn evaluate_outcome(&self) -> Option<BattleOutcome> {
        let player_alive = self.side(SideId::Player).has_available();
        let enemy_alive = self.side(SideId::Enemy).has_available();
        match (player_alive, enemy_alive) {
            (true, true) => None,
            (false, false) => Some(BattleOutcome::Draw),
            (false, true) => Some(BattleOutcome::Victory(SideId::Enemy)),
            (true, false) => {
                let enemy = self.side(SideId::Enemy);
                if enemy.roster.iter().any(|c| c.captured) {
                    Some(BattleOutcome::Captured)
                } else if enemy.roster.iter().all(|c| c.is_fainted()) {
                    Some(BattleOutcome::Victory(SideId::Player))
                } else {
                    // Wild combatants that left on their own.
                    Some(BattleOutcome::Fled)
                }
            }
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, BattleStatus::Ended(_))
    }

    pub fn display_name(&self, combatant: CombatantRef) -> String {
        match self.combatant(combatant) {
            Ok(c) => match self.side(combatant.side).controller {
                Controller::Wild => format!("the wild {}", c.name),
                Controller::Player => c.name.clone(),
                Controller::Trainer => format!("the foe's {}", c.name),
            },
            Err(_) => "???".to_string(),
        }
    }
}

// --- EVENTS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveFailureReason {
    Asleep,
    Frozen,
    FullyParalyzed,
    NoPpRemaining,
    NoTarget,
    PreventedByAbility,
    NothingToCounter,
    Declined(DeclineReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Fainted,
    NotOnField,
    BattleOver,
    NoLongerValid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    Move(Move),
    DelayedAttack(Move),
    Recoil,
    SelfKnockout,
    Status(StatusType),
    Weather(WeatherKind),
    Spikes,
}

/// Plain-data record of what happened, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    // Turn management
    TurnStarted {
        turn: u32,
    },
    TurnEnded {
        turn: u32,
    },
    ActionSkipped {
        combatant: CombatantRef,
        reason: SkipReason,
    },

    // Field membership
    SwitchedOut {
        position: FieldPosition,
        combatant: CombatantRef,
    },
    SwitchedIn {
        position: FieldPosition,
        combatant: CombatantRef,
    },
    LeftField {
        position: FieldPosition,
        combatant: CombatantRef,
    },
    Fainted {
        position: FieldPosition,
        combatant: CombatantRef,
    },
    ReplacementsRequired {
        positions: Vec<FieldPosition>,
    },

    // Moves
    MoveUsed {
        user: CombatantRef,
        move_used: Move,
    },
    MoveFailed {
        user: CombatantRef,
        move_used: Move,
        reason: MoveFailureReason,
    },
    MoveMissed {
        user: CombatantRef,
        target: CombatantRef,
        move_used: Move,
    },
    NoEffect {
        target: CombatantRef,
        move_used: Move,
    },
    CriticalHit {
        target: CombatantRef,
    },
    Effectiveness {
        target: CombatantRef,
        multiplier: f32,
    },
    HitCount {
        user: CombatantRef,
        hits: u8,
    },

    // HP
    DamageDealt {
        target: CombatantRef,
        amount: u16,
        remaining_hp: u16,
        source: DamageSource,
    },
    Healed {
        target: CombatantRef,
        amount: u16,
        new_hp: u16,
    },

    // Status & stats
    StatusApplied {
        target: CombatantRef,
        status: StatusType,
    },
    StatusCured {
        target: CombatantRef,
        status: StatusType,
    },
    StatStageChanged {
        target: CombatantRef,
        stat: StatType,
        old_stage: i8,
        new_stage: i8,
    },
    StatChangeBlocked {
        target: CombatantRef,
        stat: StatType,
    },

    // Abilities & modifiers
    AbilityActivated {
        combatant: CombatantRef,
        ability: AbilityId,
    },
    ItemActivated {
        combatant: CombatantRef,
        item: HeldItem,
    },
    ItemConsumed {
        combatant: CombatantRef,
        item: HeldItem,
    },
    BagItemUsed {
        target: CombatantRef,
        item: BagItem,
    },
    SideModifierStarted {
        side: SideId,
        kind: ModifierKind,
    },
    SideModifierEnded {
        side: SideId,
        kind: ModifierKind,
    },

    // Field
    WeatherStarted {
        weather: WeatherKind,
    },
    WeatherEnded {
        weather: WeatherKind,
    },
    SpikesSet {
        side: SideId,
        layers: u8,
    },

    // Positional tags
    TagScheduled {
        tag_id: u64,
        position: FieldPosition,
    },
    OperationDeclined {
        reason: DeclineReason,
    },
    DelayedAttackLanded {
        target: CombatantRef,
        move_used: Move,
    },
    DelayedHealLanded {
        target: CombatantRef,
    },

    // Capture
    CaptureAttempted {
        target: CombatantRef,
        ball: Pokeball,
        modified_rate: u32,
        critical: bool,
    },
    CaptureCheck {
        target: CombatantRef,
        check: u8,
        passed: bool,
    },
    CaptureSucceeded {
        target: CombatantRef,
        checks_passed: u8,
    },
    CaptureFailed {
        target: CombatantRef,
        checks_passed: u8,
    },
    AcquisitionHandOff {
        target: CombatantRef,
        roster_full: bool,
    },

    // Flee & end
    FleeAttempted {
        success: bool,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, state: &BattleState) -> Option<String> {
        let name = |c: &CombatantRef| state.display_name(*c);
        match self {
            BattleEvent::TurnStarted { turn } => Some(format!("=== Turn {} ===", turn)),
            BattleEvent::TurnEnded { .. } | BattleEvent::ActionSkipped { .. } => None,

            BattleEvent::SwitchedOut { combatant, .. } => {
                Some(format!("{} withdrew {}!", state.side(combatant.side).name, name(combatant)))
            }
            BattleEvent::SwitchedIn { combatant, .. } => Some(format!("Go! {}!", name(combatant))),
            BattleEvent::LeftField { combatant, .. } => Some(format!("{} fled!", name(combatant))),
            BattleEvent::Fainted { combatant, .. } => Some(format!("{} fainted!", name(combatant))),
            BattleEvent::ReplacementsRequired { .. } => None,

            BattleEvent::MoveUsed { user, move_used } => {
                Some(format!("{} used {}!", name(user), move_used))
            }
            BattleEvent::MoveFailed { user, reason, .. } => Some(match reason {
                MoveFailureReason::Asleep => format!("{} is fast asleep.", name(user)),
                MoveFailureReason::Frozen => format!("{} is frozen solid!", name(user)),
                MoveFailureReason::FullyParalyzed => {
                    format!("{} is paralyzed! It can't move!", name(user))
                }
                MoveFailureReason::NoPpRemaining => "There's no PP left for this move!".to_string(),
                MoveFailureReason::Declined(decline) => format!("But it failed! ({})", decline),
                _ => "But it failed!".to_string(),
            }),
            BattleEvent::MoveMissed { user, .. } => {
                Some(format!("{}'s attack missed!", name(user)))
            }
            BattleEvent::NoEffect { target, .. } => {
                Some(format!("It doesn't affect {}...", name(target)))
            }
            BattleEvent::CriticalHit { .. } => Some("A critical hit!".to_string()),
            BattleEvent::Effectiveness { multiplier, .. } => {
                if *multiplier > 1.0 {
                    Some("It's super effective!".to_string())
                } else if *multiplier < 1.0 && *multiplier > 0.0 {
                    Some("It's not very effective...".to_string())
                } else {
                    None
                }
            }
            BattleEvent::HitCount { hits, .. } => Some(format!("Hit {} time(s)!", hits)),

            BattleEvent::DamageDealt { target, amount, source, .. } => Some(match source {
                DamageSource::Recoil => format!("{} is damaged by recoil!", name(target)),
                DamageSource::Status(status) => {
                    format!("{} is hurt because it is {}!", name(target), status)
                }
                DamageSource::Weather(weather) => {
                    format!("{} is buffeted by the {}!", name(target), weather)
                }
                DamageSource::Spikes => format!("{} is hurt by spikes!", name(target)),
                _ => format!("{} took {} damage!", name(target), amount),
            }),
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name(target), amount))
            }

            BattleEvent::StatusApplied { target, status } => {
                Some(format!("{} is {}!", name(target), status))
            }
            BattleEvent::StatusCured { target, status } => {
                Some(format!("{} is no longer {}.", name(target), status))
            }
            BattleEvent::StatStageChanged { target, stat, old_stage, new_stage } => {
                let verb = if new_stage > old_stage { "rose" } else { "fell" };
                Some(format!("{}'s {} {}!", name(target), stat, verb))
            }
            BattleEvent::StatChangeBlocked { target, stat } => {
                Some(format!("{}'s {} won't go any further!", name(target), stat))
            }

            BattleEvent::AbilityActivated { combatant, ability } => {
                Some(format!("[{}'s {}]", name(combatant), ability))
            }
            BattleEvent::ItemActivated { .. } => None,
            BattleEvent::ItemConsumed { combatant, item } => {
                Some(format!("{} used up its {}!", name(combatant), item))
            }
            BattleEvent::BagItemUsed { target, item } => {
                Some(format!("Used a {} on {}.", item, name(target)))
            }
            BattleEvent::SideModifierStarted { side, kind } => {
                Some(format!("{} is protected by {:?}!", state.side(*side).name, kind))
            }
            BattleEvent::SideModifierEnded { side, kind } => {
                Some(format!("{}'s {:?} petered out.", state.side(*side).name, kind))
            }

            BattleEvent::WeatherStarted { weather } => Some(format!("The {} began!", weather)),
            BattleEvent::WeatherEnded { weather } => Some(format!("The {} subsided.", weather)),
            BattleEvent::SpikesSet { side, .. } => Some(format!(
                "Spikes were scattered around {}'s feet!",
                state.side(*side).name
            )),

            BattleEvent::TagScheduled { .. } => None,
            BattleEvent::OperationDeclined { .. } => None,
            BattleEvent::DelayedAttackLanded { target, move_used } => {
                Some(format!("{} took the {} attack!", name(target), move_used))
            }
            BattleEvent::DelayedHealLanded { target } => {
                Some(format!("{}'s wish came true!", name(target)))
            }

            BattleEvent::CaptureAttempted { ball, critical, .. } => Some(if *critical {
                format!("A critical capture with the {}!", ball)
            } else {
                format!("You threw a {}!", ball)
            }),
            BattleEvent::CaptureCheck { .. } => None,
            BattleEvent::CaptureSucceeded { target, .. } => {
                Some(format!("Gotcha! {} was caught!", name(target)))
            }
            BattleEvent::CaptureFailed { checks_passed, .. } => Some(match checks_passed {
                0 => "Oh no! It broke free!".to_string(),
                1 => "Aww! It appeared to be caught!".to_string(),
                _ => "Argh! Almost had it!".to_string(),
            }),
            BattleEvent::AcquisitionHandOff { .. } => None,

            BattleEvent::FleeAttempted { success } => Some(if *success {
                "Got away safely!".to_string()
            } else {
                "Can't escape!".to_string()
            }),
            BattleEvent::BattleEnded { outcome } => Some(match outcome {
                BattleOutcome::Victory(side) => format!("{} won the battle!", state.side(*side).name),
                BattleOutcome::Draw => "The battle ended in a draw!".to_string(),
                BattleOutcome::Captured => "The battle is over.".to_string(),
                BattleOutcome::Fled => "The battle is over.".to_string(),
            }),
        }
    }
}

/// Ordered log of events produced while the battle runs.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Hands the accumulated events to the caller and starts a fresh log.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Print all events using their formatted text (when available).
    pub fn print_formatted(&self, state: &BattleState) {
        for event in &self.events {
            if let Some(text) = event.format(state) {
                println!("  {}", text);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}
