use crate::battle::modifiers::{Modifier, ModifierKind, ModifierOwner};
use crate::battle::state::{CombatantRef, SideId};
use schema::{
    AbilityId, BaseStats, HeldItem, Move, MoveData, PokemonType, Species, SpeciesData, StatType,
    StatusType,
};
use serde::{Deserialize, Serialize};

pub const MAX_STAGE: i8 = 6;
pub const MIN_STAGE: i8 = -6;

/// Index into [`Combatant::stats`].
pub const HP: usize = 0;
pub const ATK: usize = 1;
pub const DEF: usize = 2;
pub const SP_ATK: usize = 3;
pub const SP_DEF: usize = 4;
pub const SPE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub move_: Move,
    pub pp: u8,
    pub max_pp: u8,
}

impl MoveSlot {
    pub fn new(data: &MoveData) -> Self {
        Self {
            move_: data.id,
            pp: data.max_pp,
            max_pp: data.max_pp,
        }
    }

    /// Spend one use. Returns false if none were left.
    pub fn use_pp(&mut self) -> bool {
        if self.pp > 0 {
            self.pp -= 1;
            true
        } else {
            false
        }
    }
}

/// A non-volatile status with its counter.
///
/// `counter` is the remaining sleep turns for `Sleep` and the escalation step
/// for `Toxic`; other statuses ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCondition {
    pub kind: StatusType,
    pub counter: u8,
}

impl StatusCondition {
    pub fn new(kind: StatusType) -> Self {
        Self { kind, counter: 0 }
    }

    pub fn sleep(turns: u8) -> Self {
        Self {
            kind: StatusType::Sleep,
            counter: turns,
        }
    }
}

/// State cleared when a combatant leaves the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatileState {
    pub unburden: bool,
    /// Per-turn: physical damage received and who dealt it last.
    pub physical_damage_taken: u16,
    pub last_physical_attacker: Option<CombatantRef>,
}

impl VolatileState {
    pub fn clear_turn_data(&mut self) {
        self.physical_damage_taken = 0;
        self.last_physical_attacker = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub species: Species,
    pub name: String,
    pub level: u8,
    pub types: Vec<PokemonType>,
    pub stats: [u16; 6], // HP, ATK, DEF, SP.ATK, SP.DEF, SPE
    current_hp: u16,
    pub status: Option<StatusCondition>,
    pub ability: AbilityId,
    pub moves: Vec<MoveSlot>,
    /// Held modifiers in acquisition order.
    pub modifiers: Vec<Modifier>,
    stat_stages: [i8; StatType::STAGE_COUNT],
    pub field_slot: Option<usize>,
    pub side: SideId,
    pub volatile: VolatileState,
    /// Left the battle without fainting (wild self-switch).
    pub departed: bool,
    pub captured: bool,
}

impl Combatant {
    pub fn new(species: &SpeciesData, level: u8, moves: &[&MoveData]) -> Self {
        let stats = Self::calculate_stats(&species.base_stats, level);
        Self {
            species: species.species,
            name: species.name.clone(),
            level,
            types: species.types.clone(),
            stats,
            current_hp: stats[HP],
            status: None,
            ability: species.ability,
            moves: moves.iter().take(4).map(|data| MoveSlot::new(data)).collect(),
            modifiers: Vec::new(),
            stat_stages: [0; StatType::STAGE_COUNT],
            field_slot: None,
            side: SideId::Player,
            volatile: VolatileState::default(),
            departed: false,
            captured: false,
        }
    }

    /// Gen 3+ formula with neutral IVs, no EVs and no nature.
    fn calculate_stats(base: &BaseStats, level: u8) -> [u16; 6] {
        let level = u32::from(level);
        let base = [
            base.hp,
            base.attack,
            base.defense,
            base.sp_attack,
            base.sp_defense,
            base.speed,
        ];
        let mut stats = [0u16; 6];
        for (i, &b) in base.iter().enumerate() {
            let scaled = 2 * u32::from(b) * level / 100;
            let value = if i == HP {
                scaled + level + 10
            } else {
                scaled + 5
            };
            stats[i] = value.min(u32::from(u16::MAX)) as u16;
        }
        stats
    }

    pub fn max_hp(&self) -> u16 {
        self.stats[HP]
    }

    pub fn current_hp(&self) -> u16 {
        self.current_hp
    }

    /// Sets HP, clamped to `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: u16) {
        self.current_hp = hp.min(self.max_hp());
    }

    /// Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let dealt = amount.min(self.current_hp);
        self.current_hp -= dealt;
        dealt
    }

    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: u16) -> u16 {
        let before = self.current_hp;
        self.set_hp(before.saturating_add(amount));
        self.current_hp - before
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// Healthy and still part of the battle.
    pub fn is_available(&self) -> bool {
        !self.is_fainted() && !self.departed && !self.captured
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.types.contains(&pokemon_type)
    }

    pub fn stat_stage(&self, stat: StatType) -> i8 {
        self.stat_stages[stat.stage_index()]
    }

    /// Applies a stage delta with clamping. Returns `(old, new)`.
    pub fn modify_stat_stage(&mut self, stat: StatType, delta: i8) -> (i8, i8) {
        let old = self.stat_stage(stat);
        let new = old.saturating_add(delta).clamp(MIN_STAGE, MAX_STAGE);
        self.stat_stages[stat.stage_index()] = new;
        (old, new)
    }

    pub fn reset_stat_stages(&mut self) {
        self.stat_stages = [0; StatType::STAGE_COUNT];
    }

    /// Clears everything that does not survive a trip off the field.
    pub fn on_recall(&mut self) {
        self.reset_stat_stages();
        self.volatile = VolatileState::default();
        self.field_slot = None;
    }

    pub fn has_status(&self, kind: StatusType) -> bool {
        self.status.is_some_and(|status| status.kind == kind)
    }

    pub fn held_item(&self) -> Option<HeldItem> {
        self.modifiers.iter().find_map(|modifier| match modifier.kind {
            ModifierKind::Held(item) => Some(item),
            _ => None,
        })
    }

    pub fn modifier_stacks(&self, kind: ModifierKind) -> u8 {
        self.modifiers
            .iter()
            .filter(|modifier| modifier.kind == kind)
            .map(|modifier| modifier.stacks)
            .sum()
    }

    /// Gives this combatant a held modifier, stacking onto an existing one of the same kind.
    pub fn attach_item(&mut self, item: HeldItem, owner: CombatantRef, acquired: u64) {
        let kind = ModifierKind::Held(item);
        if let Some(existing) = self.modifiers.iter_mut().find(|m| m.kind == kind) {
            existing.stacks = existing.stacks.saturating_add(1).min(kind.max_stacks());
            return;
        }
        self.modifiers
            .push(Modifier::new(kind, ModifierOwner::Combatant(owner), acquired));
    }

    pub fn move_slot(&self, index: usize) -> Option<&MoveSlot> {
        self.moves.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::Dex;

    fn pikachu() -> Combatant {
        let dex = Dex::builtin().unwrap();
        let species = dex.species(Species::Pikachu).unwrap();
        let tackle = dex.move_data(Move::Tackle).unwrap();
        Combatant::new(species, 50, &[tackle])
    }

    #[test]
    fn test_stats_follow_level_formula() {
        let combatant = pikachu();
        // HP: 2*35*50/100 + 50 + 10 = 95, Speed: 2*90*50/100 + 5 = 95
        assert_eq!(combatant.max_hp(), 95);
        assert_eq!(combatant.stats[SPE], 95);
        assert_eq!(combatant.current_hp(), 95);
    }

    #[test]
    fn test_hp_is_clamped_on_every_mutation() {
        let mut combatant = pikachu();
        assert_eq!(combatant.take_damage(500), 95);
        assert_eq!(combatant.current_hp(), 0);
        assert!(combatant.is_fainted());
        assert_eq!(combatant.heal(1000), 95);
        combatant.set_hp(u16::MAX);
        assert_eq!(combatant.current_hp(), 95);
    }

    #[test]
    fn test_stat_stages_clamp() {
        let mut combatant = pikachu();
        assert_eq!(combatant.modify_stat_stage(StatType::Atk, 4), (0, 4));
        assert_eq!(combatant.modify_stat_stage(StatType::Atk, 4), (4, 6));
        assert_eq!(combatant.modify_stat_stage(StatType::Eva, -8), (0, -6));
        combatant.on_recall();
        assert_eq!(combatant.stat_stage(StatType::Atk), 0);
    }

    #[test]
    fn test_item_stacks_accumulate() {
        let mut combatant = pikachu();
        let owner = CombatantRef::new(SideId::Player, 0);
        combatant.attach_item(HeldItem::MultiLens, owner, 1);
        combatant.attach_item(HeldItem::MultiLens, owner, 2);
        assert_eq!(combatant.modifiers.len(), 1);
        assert_eq!(
            combatant.modifier_stacks(ModifierKind::Held(HeldItem::MultiLens)),
            2
        );
    }
}
