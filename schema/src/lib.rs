// Battle Schema - Shared type definitions
// Static, serializable data shared by the battle engine: the type chart,
// move/species/ability/item identifiers and the effect descriptors a move
// carries. Nothing in here knows about a running battle.

// Re-export the main types
pub use abilities::*;
pub use battle_data::*;
pub use items::*;
pub use move_types::*;
pub use moves::*;
pub use pokemon_types::*;
pub use species::*;

pub mod abilities;
pub mod battle_data;
pub mod items;
pub mod move_types;
pub mod moves;
pub mod pokemon_types;
pub mod species;
