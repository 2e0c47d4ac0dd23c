use crate::battle::commands::{ActionChoice, TurnAction};
use crate::battle::engine::{Battle, RunStatus};
use crate::battle::rng::TurnRng;
use crate::battle::state::{
    BattleEvent, CombatantRef, Controller, DamageSource, FieldPosition, Side, SideId,
};
use crate::config::BattleConfig;
use crate::dex::Dex;
use crate::errors::ConfigError;
use crate::pokemon::{Combatant, StatusCondition};
use schema::{BattleFormat, BattleKind, HeldItem, Move, MoveData, Species, StatusType};
use std::sync::Arc;

/// A builder for creating test combatants with common defaults.
///
/// # Example
/// ```
/// let pikachu = TestCombatantBuilder::new(Species::Pikachu, 25)
///     .with_moves(vec![Move::Tackle])
///     .with_status(StatusType::Paralysis)
///     .build(&dex);
/// ```
#[derive(Debug, Clone)]
pub struct TestCombatantBuilder {
    species: Species,
    level: u8,
    moves: Vec<Move>,
    status: Option<StatusType>,
    current_hp: Option<u16>,
    item: Option<HeldItem>,
}

impl TestCombatantBuilder {
    pub fn new(species: Species, level: u8) -> Self {
        Self {
            species,
            level,
            moves: vec![Move::Tackle],
            status: None,
            current_hp: None,
            item: None,
        }
    }

    pub fn with_moves(mut self, moves: Vec<Move>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_status(mut self, status: StatusType) -> Self {
        self.status = Some(status);
        self
    }

    /// If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_item(mut self, item: HeldItem) -> Self {
        self.item = Some(item);
        self
    }

    pub fn build(self, dex: &Dex) -> Combatant {
        let species = match dex.species(self.species) {
            Ok(data) => data,
            Err(err) => panic!("Failed to load species data for {:?}: {}", self.species, err),
        };
        let moves: Vec<&MoveData> = self
            .moves
            .iter()
            .map(|&id| match dex.move_data(id) {
                Ok(data) => data,
                Err(err) => panic!("Failed to load move data for {:?}: {}", id, err),
            })
            .collect();
        let mut combatant = Combatant::new(species, self.level, &moves);
        combatant.status = self.status.map(StatusCondition::new);
        if let Some(hp) = self.current_hp {
            combatant.set_hp(hp);
        }
        if let Some(item) = self.item {
            // Owner and acquisition order are fixed up by Side::new and BattleState::new.
            combatant.attach_item(item, CombatantRef::new(SideId::Player, 0), 0);
        }
        combatant
    }
}

/// Assembles a battle from builders, with a seeded or scripted RNG.
pub struct TestBattleBuilder {
    config: BattleConfig,
    dex: Dex,
    player: Vec<TestCombatantBuilder>,
    enemy: Vec<TestCombatantBuilder>,
    rng: Option<TurnRng>,
}

impl TestBattleBuilder {
    /// A singles trainer battle seeded with 7.
    pub fn new() -> Self {
        Self {
            config: BattleConfig::default()
                .with_kind(BattleKind::Trainer)
                .with_seed(7),
            dex: Dex::builtin().expect("built-in dex should load"),
            player: Vec::new(),
            enemy: Vec::new(),
            rng: None,
        }
    }

    pub fn wild(mut self) -> Self {
        self.config = self.config.with_kind(BattleKind::Wild);
        self
    }

    pub fn doubles(mut self) -> Self {
        self.config = self.config.with_format(BattleFormat::Doubles);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    pub fn with_acknowledgements(mut self) -> Self {
        self.config.await_acknowledgements = true;
        self
    }

    pub fn with_config(mut self, edit: impl FnOnce(&mut BattleConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Replaces the dex entry for `data.id`.
    pub fn with_move_data(mut self, data: MoveData) -> Self {
        self.dex.insert_move(data);
        self
    }

    /// Raw values returned by the RNG before it falls back to the seed.
    pub fn scripted(mut self, values: Vec<u32>) -> Self {
        let seed = self.config.seed.unwrap_or_default();
        let mut rng = TurnRng::seeded(seed);
        rng.push_script(values);
        self.rng = Some(rng);
        self
    }

    pub fn player(mut self, combatant: TestCombatantBuilder) -> Self {
        self.player.push(combatant);
        self
    }

    pub fn enemy(mut self, combatant: TestCombatantBuilder) -> Self {
        self.enemy.push(combatant);
        self
    }

    pub fn build(self) -> Battle {
        match self.try_build() {
            Ok(battle) => battle,
            Err(err) => panic!("test battle config should be valid: {}", err),
        }
    }

    pub fn try_build(self) -> Result<Battle, ConfigError> {
        let player_roster = self.player.into_iter().map(|b| b.build(&self.dex)).collect();
        let enemy_roster = self.enemy.into_iter().map(|b| b.build(&self.dex)).collect();
        let player = Side::new(SideId::Player, "Player", Controller::Player, player_roster);
        let enemy = match self.config.kind {
            BattleKind::Wild => Side::new(SideId::Enemy, "Wild", Controller::Wild, enemy_roster),
            BattleKind::Trainer => {
                Side::new(SideId::Enemy, "Rival", Controller::Trainer, enemy_roster)
            }
        };
        let dex = Arc::new(self.dex);
        match self.rng {
            Some(rng) => Battle::with_rng(self.config, dex, player, enemy, rng),
            None => Battle::new(self.config, dex, player, enemy),
        }
    }
}

pub const PLAYER_0: FieldPosition = FieldPosition::new(SideId::Player, 0);
pub const PLAYER_1: FieldPosition = FieldPosition::new(SideId::Player, 1);
pub const ENEMY_0: FieldPosition = FieldPosition::new(SideId::Enemy, 0);
pub const ENEMY_1: FieldPosition = FieldPosition::new(SideId::Enemy, 1);

pub fn player(index: usize) -> CombatantRef {
    CombatantRef::new(SideId::Player, index)
}

pub fn enemy(index: usize) -> CombatantRef {
    CombatantRef::new(SideId::Enemy, index)
}

pub fn use_move(position: FieldPosition, move_index: usize) -> ActionChoice {
    ActionChoice::new(
        position,
        TurnAction::UseMove {
            move_index,
            target: None,
        },
    )
}

pub fn use_move_on(
    position: FieldPosition,
    move_index: usize,
    target: FieldPosition,
) -> ActionChoice {
    ActionChoice::new(
        position,
        TurnAction::UseMove {
            move_index,
            target: Some(target),
        },
    )
}

/// Runs the battle until it first asks for commands and clears the opening events.
pub fn start(battle: &mut Battle) {
    let status = battle.run().expect("battle should start");
    assert_eq!(status, RunStatus::AwaitingCommands);
    battle.take_events();
}

/// Submits one turn and runs until the battle needs something again.
pub fn play_turn(battle: &mut Battle, choices: Vec<ActionChoice>) -> RunStatus {
    battle
        .submit_turn(choices)
        .expect("turn commands should be accepted");
    battle.run().expect("turn should run")
}

pub fn count_events(events: &[BattleEvent], predicate: impl Fn(&BattleEvent) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

/// Damage events against `target` from `source`, in order.
pub fn damage_to(events: &[BattleEvent], target: CombatantRef, source: DamageSource) -> Vec<u16> {
    events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::DamageDealt {
                target: hit,
                amount,
                source: from,
                ..
            } if *hit == target && *from == source => Some(*amount),
            _ => None,
        })
        .collect()
}

pub fn first_mover(events: &[BattleEvent]) -> Option<CombatantRef> {
    events.iter().find_map(|event| match event {
        BattleEvent::MoveUsed { user, .. } => Some(*user),
        _ => None,
    })
}
