//! Persistence boundary.
//!
//! A snapshot holds the full [`BattleState`] (combatants, arena, turn counter
//! and positional tags), the RNG position and the config. The phase queue is
//! not part of it: restoring queues a fresh turn init.

use crate::battle::engine::Battle;
use crate::battle::rng::RngState;
use crate::battle::state::{BattleState, SideId};
use crate::config::BattleConfig;
use crate::dex::Dex;
use crate::errors::SnapshotError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub version: u16,
    pub state: BattleState,
    pub rng: RngState,
    pub config: BattleConfig,
}

impl BattleSnapshot {
    pub fn capture(battle: &Battle) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state: battle.state.clone(),
            rng: battle.rng.state(),
            config: battle.config.clone(),
        }
    }

    /// Compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: BattleSnapshot = postcard::from_bytes(bytes)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let snapshot: BattleSnapshot = serde_json::from_str(text)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }

    /// Field slots and combatant back-references must agree, and every
    /// species must exist in the dex the battle resumes with.
    fn check_consistency(&self, dex: &Dex) -> Result<(), SnapshotError> {
        let slots = self.state.format.slots();
        for side_id in SideId::BOTH {
            let side = self.state.side(side_id);
            if side.field.len() != slots {
                return Err(SnapshotError::Inconsistent(format!(
                    "{:?} side has {} field slots, format needs {}",
                    side_id,
                    side.field.len(),
                    slots
                )));
            }
            for (slot, occupant) in side.field.iter().enumerate() {
                let Some(index) = *occupant else { continue };
                let member = side.roster.get(index).ok_or_else(|| {
                    SnapshotError::Inconsistent(format!(
                        "{:?} slot {} points at missing roster member {}",
                        side_id, slot, index
                    ))
                })?;
                if member.field_slot != Some(slot) {
                    return Err(SnapshotError::Inconsistent(format!(
                        "{:?} roster member {} does not know it stands in slot {}",
                        side_id, index, slot
                    )));
                }
            }
            for member in &side.roster {
                dex.species(member.species)?;
            }
        }
        Ok(())
    }

    /// Rebuilds a battle that continues exactly where this snapshot left off.
    pub fn restore(self, dex: Arc<Dex>) -> Result<Battle, SnapshotError> {
        self.check_version()?;
        self.config.validate()?;
        self.check_consistency(&dex)?;
        debug!(
            battle_id = %self.state.battle_id,
            turn = self.state.turn,
            tags = self.state.positional_tags.len(),
            "restoring snapshot"
        );
        Ok(Battle::resume(self.state, dex, self.config, self.rng))
    }
}

