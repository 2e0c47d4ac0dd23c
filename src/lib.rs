//! Creature Battle Engine
//!
//! The progression core of a turn-based creature battle: a phase scheduler,
//! turn ordering, an ability/modifier trigger bus, move resolution,
//! slot-bound delayed effects, capture and end-of-turn ticks. Presentation,
//! rosters and persistence storage live outside; the battle talks to them
//! through events, commands and snapshots.

pub mod battle;
pub mod config;
pub mod dex;
pub mod errors;
pub mod pokemon;

// --- PUBLIC API RE-EXPORTS ---

// Static data definitions from the `schema` crate.
pub use schema::{
    AbilityId, BagItem, BattleFormat, BattleKind, HeldItem, Move, MoveCategory, MoveData,
    MoveEffect, MoveTarget, PokemonType, Pokeball, Species, SpeciesData, StatType, StatusType,
    WeatherKind,
};

// Running a battle.
pub use battle::commands::{ActionChoice, TurnAction};
pub use battle::engine::{Battle, RunStatus};
pub use battle::snapshot::BattleSnapshot;
pub use battle::state::{
    BattleEvent, BattleOutcome, BattleState, CombatantRef, Controller, FieldPosition, Side, SideId,
};
pub use battle::switching::ReplacementChoice;
pub use config::BattleConfig;
pub use dex::Dex;
pub use pokemon::Combatant;

pub use errors::{
    BattleError, BattleResult, CommandRejection, ConfigError, DataError, DeclineReason,
    SnapshotError,
};
