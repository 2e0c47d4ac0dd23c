use crate::battle::positional_tags::PositionalTag;
use crate::battle::state::{CombatantRef, FieldPosition};
use schema::{BagItem, Move, Pokeball, StatType};

/// One queued unit of battle progression.
///
/// Closed set of variants; the engine dispatches each through a single match.
/// A phase is never mutated once queued. Multi-step effects queue follow-up
/// phases instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Runs entry effects for the opening line-up, fastest first.
    BattleStart,
    /// Waits for turn commands, then orders them and queues one phase per action.
    TurnInit,
    /// Waits for replacement choices after faints.
    Replacement,
    /// Places a roster member into an empty slot and runs entry effects.
    Summon(SummonPhase),
    /// Recalls the current occupant, then summons the replacement.
    Switch(SwitchPhase),
    UseItem(UseItemPhase),
    AttemptCapture(CapturePhase),
    AttemptFlee(FleePhase),
    Move(MovePhase),
    MoveEffect(MoveEffectPhase),
    MoveEnd(MoveEndPhase),
    StatChange(StatChangePhase),
    Faint(FaintPhase),
    /// Advances positional tags and the turn counter together.
    TurnBoundary,
    FirePositionalTag(PositionalTag),
    WeatherTick,
    StatusTick,
    TurnEnd,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::BattleStart => "BattleStart",
            Phase::TurnInit => "TurnInit",
            Phase::Replacement => "Replacement",
            Phase::Summon(_) => "Summon",
            Phase::Switch(_) => "Switch",
            Phase::UseItem(_) => "UseItem",
            Phase::AttemptCapture(_) => "AttemptCapture",
            Phase::AttemptFlee(_) => "AttemptFlee",
            Phase::Move(_) => "Move",
            Phase::MoveEffect(_) => "MoveEffect",
            Phase::MoveEnd(_) => "MoveEnd",
            Phase::StatChange(_) => "StatChange",
            Phase::Faint(_) => "Faint",
            Phase::TurnBoundary => "TurnBoundary",
            Phase::FirePositionalTag(_) => "FirePositionalTag",
            Phase::WeatherTick => "WeatherTick",
            Phase::StatusTick => "StatusTick",
            Phase::TurnEnd => "TurnEnd",
        }
    }

    /// Phases whose result is worth pausing on when acknowledgements are enabled.
    pub fn is_presentational(&self) -> bool {
        matches!(
            self,
            Phase::Summon(_)
                | Phase::Switch(_)
                | Phase::MoveEnd(_)
                | Phase::Faint(_)
                | Phase::AttemptCapture(_)
                | Phase::FirePositionalTag(_)
        )
    }

    /// The combatant whose action this phase carries out, if any.
    pub fn actor(&self) -> Option<CombatantRef> {
        match self {
            Phase::Move(phase) => Some(phase.user),
            Phase::Switch(phase) => Some(phase.outgoing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummonPhase {
    pub position: FieldPosition,
    pub party_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchPhase {
    pub position: FieldPosition,
    pub outgoing: CombatantRef,
    pub party_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseItemPhase {
    pub user: FieldPosition,
    pub item: BagItem,
    pub party_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturePhase {
    pub thrower: FieldPosition,
    pub target: FieldPosition,
    pub ball: Pokeball,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FleePhase {
    pub position: FieldPosition,
}

/// A combatant using one of its move slots.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePhase {
    pub user: CombatantRef,
    pub move_index: usize,
    /// Chosen target slot, for moves that take one.
    pub target: Option<FieldPosition>,
}

/// One strike of a move against its resolved targets.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEffectPhase {
    pub user: CombatantRef,
    pub move_used: Move,
    pub targets: Vec<CombatantRef>,
    /// Zero-based index of this strike.
    pub strike: u8,
    /// Decided on the first strike; zero until then.
    pub total_strikes: u8,
    /// Strikes beyond the first that came from abilities or items.
    pub extra_strikes: u8,
    /// Targets that were missed on the first strike.
    pub missed: Vec<CombatantRef>,
    pub damage_so_far: u32,
    pub landed: bool,
    /// Set for delayed attacks: the user may be off the field.
    pub detached_user: bool,
}

impl MoveEffectPhase {
    pub fn first(user: CombatantRef, move_used: Move, targets: Vec<CombatantRef>) -> Self {
        Self {
            user,
            move_used,
            targets,
            strike: 0,
            total_strikes: 0,
            extra_strikes: 0,
            missed: Vec::new(),
            damage_so_far: 0,
            landed: false,
            detached_user: false,
        }
    }

    pub fn detached(mut self) -> Self {
        self.detached_user = true;
        self
    }
}

/// Once-per-use effects after every strike has resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEndPhase {
    pub user: CombatantRef,
    pub move_used: Move,
    pub targets: Vec<CombatantRef>,
    pub strikes: u8,
    pub total_damage: u32,
    pub landed: bool,
    pub detached_user: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatChangePhase {
    pub target: CombatantRef,
    pub stat: StatType,
    pub stages: i8,
    pub source: Option<CombatantRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaintPhase {
    pub combatant: CombatantRef,
    pub source: Option<CombatantRef>,
}

/// What a phase handler reports back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Done,
    /// Park until the presentation layer acknowledges.
    AwaitAck,
    /// Park until commands are submitted.
    AwaitCommands,
    /// Park until replacements are submitted.
    AwaitReplacements,
}
