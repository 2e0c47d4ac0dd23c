use super::common::*;
use crate::battle::commands::{ActionChoice, TurnAction};
use crate::battle::engine::RunStatus;
use crate::battle::state::{BattleEvent, DamageSource};
use crate::battle::switching::ReplacementChoice;
use crate::errors::CommandRejection;
use pretty_assertions::assert_eq;
use schema::{Move, Species, StatType};

fn switch_to(party_index: usize) -> ActionChoice {
    ActionChoice::new(PLAYER_0, TurnAction::Switch { party_index })
}

#[test]
fn test_switch_in_takes_the_incoming_hit() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Pikachu, 50))
        .player(TestCombatantBuilder::new(Species::Onix, 50))
        .enemy(TestCombatantBuilder::new(Species::Rattata, 50).with_moves(vec![Move::Tackle]))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![switch_to(1), use_move(ENEMY_0, 0)]);

    let events = battle.take_events();
    let order: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            matches!(
                e,
                BattleEvent::SwitchedOut { .. } | BattleEvent::SwitchedIn { .. } | BattleEvent::MoveUsed { .. }
            )
        })
        .map(|(i, _)| i)
        .collect();
    assert_eq!(order.len(), 3);
    assert!(matches!(events[order[0]], BattleEvent::SwitchedOut { .. }));
    assert!(matches!(events[order[1]], BattleEvent::SwitchedIn { .. }));

    assert_eq!(damage_to(&events, player(1), DamageSource::Move(Move::Tackle)).len(), 1);
    let pikachu = &battle.state().side(player(0).side).roster[0];
    assert_eq!(pikachu.current_hp(), pikachu.max_hp());
    assert_eq!(pikachu.field_slot, None);
    assert_eq!(battle.state().occupant(PLAYER_0), Some(player(1)));
}

#[test]
fn test_fainted_slot_waits_for_a_replacement() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Kangaskhan, 50).with_moves(vec![Move::Tackle]))
        .enemy(
            TestCombatantBuilder::new(Species::Magikarp, 5)
                .with_moves(vec![Move::Splash])
                .with_hp(1),
        )
        .enemy(TestCombatantBuilder::new(Species::Rattata, 20).with_moves(vec![Move::Tackle]))
        .build();
    start(&mut battle);
    let status = play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
    assert_eq!(status, RunStatus::AwaitingReplacements(vec![ENEMY_0]));

    // Commands are refused until the slot is refilled.
    assert_eq!(
        battle.submit_turn(vec![use_move(PLAYER_0, 0)]),
        Err(CommandRejection::NotAwaitingCommands)
    );
    assert_eq!(
        battle.submit_replacements(vec![ReplacementChoice {
            position: ENEMY_0,
            party_index: 0,
        }]),
        Err(CommandRejection::InvalidSwitchTarget(0))
    );

    battle
        .submit_replacements(vec![ReplacementChoice {
            position: ENEMY_0,
            party_index: 1,
        }])
        .unwrap();
    assert_eq!(battle.run().unwrap(), RunStatus::AwaitingCommands);
    let events = battle.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::SwitchedIn { combatant, .. } if *combatant == enemy(1)
    )));
    assert_eq!(battle.state().occupant(ENEMY_0), Some(enemy(1)));
}

#[test]
fn test_spikes_hurt_grounded_switch_ins_only() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Pikachu, 50).with_moves(vec![Move::Splash]))
        .enemy(TestCombatantBuilder::new(Species::Chansey, 50).with_moves(vec![Move::Spikes]))
        .player(TestCombatantBuilder::new(Species::Rattata, 50))
        .player(TestCombatantBuilder::new(Species::Pidgey, 50))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
    assert_eq!(battle.state().side(player(0).side).spikes, 1);

    play_turn(&mut battle, vec![switch_to(1), use_move(ENEMY_0, 0)]);
    let events = battle.take_events();
    let rattata_max = battle.state().side(player(0).side).roster[1].max_hp();
    assert_eq!(
        damage_to(&events, player(1), DamageSource::Spikes),
        vec![rattata_max / 8]
    );

    play_turn(&mut battle, vec![switch_to(2), use_move(ENEMY_0, 0)]);
    let events = battle.take_events();
    assert!(damage_to(&events, player(2), DamageSource::Spikes).is_empty());
}

#[test]
fn test_intimidate_fires_on_entry() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Pikachu, 50).with_moves(vec![Move::Splash]))
        .player(TestCombatantBuilder::new(Species::Staraptor, 50))
        .enemy(TestCombatantBuilder::new(Species::Rattata, 50).with_moves(vec![Move::Splash]))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![switch_to(1), use_move(ENEMY_0, 0)]);

    let rattata = &battle.state().side(enemy(0).side).roster[0];
    assert_eq!(rattata.stat_stage(StatType::Atk), -1);
}
