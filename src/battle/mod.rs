pub mod abilities;
pub mod actions;
pub mod ai;
pub mod capture;
pub mod commands;
pub mod conditions;
pub mod damage;
pub mod end_of_turn;
pub mod engine;
pub mod modifiers;
pub mod move_effects;
pub mod phases;
pub mod positional_tags;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod switching;
pub mod triggers;
pub mod turn_order;

#[cfg(test)]
mod tests;
