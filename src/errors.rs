use crate::battle::state::{CombatantRef, FieldPosition};
use schema::{Move, Species};
use thiserror::Error;

/// Main error type for the battle engine.
///
/// Everything except [`BattleError::SchedulerInvariant`] is recoverable: the
/// scheduler logs it and skips the phase that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BattleError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no combatant at {0:?}")]
    InvalidCombatant(CombatantRef),

    #[error("field position {0:?} does not exist in this battle")]
    InvalidPosition(FieldPosition),

    #[error("target vacated or fainted: {0:?}")]
    InvalidTarget(FieldPosition),

    #[error("move slot {slot} is empty for {combatant:?}")]
    InvalidMoveSlot { combatant: CombatantRef, slot: usize },

    #[error("trigger handler failed: {0}")]
    Handler(String),

    #[error("scheduler invariant violated: {0}")]
    SchedulerInvariant(String),
}

impl BattleError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BattleError::SchedulerInvariant(_))
    }
}

/// Static data lookups and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("move {0:?} is not in the dex")]
    MoveNotFound(Move),

    #[error("species {0:?} is not in the dex")]
    SpeciesNotFound(Species),

    #[error("malformed {table} table: {message}")]
    Malformed { table: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("binary snapshot codec failed: {0}")]
    Binary(#[from] postcard::Error),

    #[error("json snapshot codec failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version { found: u16, expected: u16 },

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why the command surface refused a turn selection. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRejection {
    #[error("the battle is not waiting for turn commands")]
    NotAwaitingCommands,

    #[error("the battle is not waiting for replacements")]
    NotAwaitingReplacements,

    #[error("the battle is not waiting for an acknowledgement")]
    NotAwaitingAck,

    #[error("no active combatant at {0:?}")]
    NoActiveCombatant(FieldPosition),

    #[error("missing command for {0:?}")]
    MissingCommand(FieldPosition),

    #[error("more than one command for {0:?}")]
    DuplicateCommand(FieldPosition),

    #[error("move slot {0} does not exist")]
    InvalidMoveSlot(usize),

    #[error("{0} has no PP left")]
    NoPpRemaining(Move),

    #[error("{0} needs a target")]
    TargetRequired(Move),

    #[error("{0:?} is not a legal target")]
    IllegalTarget(FieldPosition),

    #[error("party member {0} cannot be sent out")]
    InvalidSwitchTarget(usize),

    #[error("party member {0} is already chosen to come in")]
    SwitchTargetTaken(usize),

    #[error("bag item cannot be used on party member {0}")]
    InvalidItemTarget(usize),

    #[error("capture is only possible in wild battles")]
    CaptureNotAllowed,

    #[error("fleeing is only possible in wild battles")]
    FleeNotAllowed,

    #[error("only the player's side may {0}")]
    PlayerOnly(&'static str),
}

/// A declined operation with a reason code. Reported as an event, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DeclineReason {
    #[error("a delayed attack is already aimed at that position")]
    DuplicateDelayedAttack,

    #[error("a delayed heal is already pending for that position")]
    DuplicateDelayedHeal,

    #[error("the target cannot be captured")]
    CaptureNotAllowed,

    #[error("the roster is full")]
    RosterFull,
}

pub type BattleResult<T> = Result<T, BattleError>;
