use super::common::*;
use crate::battle::commands::{ActionChoice, TurnAction};
use crate::battle::modifiers::{Modifier, ModifierKind, ModifierOwner};
use crate::battle::state::{BattleEvent, DamageSource, SideId};
use crate::battle::triggers::{self, MoveContext, TriggerEvent, TriggerPayload};
use pretty_assertions::assert_eq;
use schema::{HeldItem, Move, MoveCategory, PokemonType, Species, StatType};

#[test]
fn test_neutralizing_gas_suppresses_other_abilities() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Kangaskhan, 50).with_moves(vec![Move::Tackle]))
        .enemy(TestCombatantBuilder::new(Species::Weezing, 50).with_moves(vec![Move::Splash]))
        .build();
    start(&mut battle);
    assert!(battle.state().abilities_suppressed());
    assert_eq!(battle.state().effective_ability(player(0)), None);

    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
    let events = battle.take_events();
    assert_eq!(
        damage_to(&events, enemy(0), DamageSource::Move(Move::Tackle)).len(),
        1
    );
}

#[test]
fn test_suppression_lifts_when_the_suppressor_leaves() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Kangaskhan, 50).with_moves(vec![Move::Tackle]))
        .enemy(TestCombatantBuilder::new(Species::Weezing, 50).with_moves(vec![Move::Splash]))
        .enemy(TestCombatantBuilder::new(Species::Onix, 50).with_moves(vec![Move::Splash]))
        .build();
    start(&mut battle);
    let swap = ActionChoice::new(ENEMY_0, TurnAction::Switch { party_index: 1 });
    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), swap]);

    assert!(!battle.state().abilities_suppressed());
    let events = battle.take_events();
    assert_eq!(
        damage_to(&events, enemy(1), DamageSource::Move(Move::Tackle)).len(),
        2
    );
}

#[test]
fn test_levitate_grants_ground_immunity() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Onix, 50).with_moves(vec![Move::Earthquake]))
        .enemy(TestCombatantBuilder::new(Species::Gengar, 50).with_moves(vec![Move::Splash]))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);

    let events = battle.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::NoEffect { target, .. } if *target == enemy(0)
    )));
    let gengar = &battle.state().side(SideId::Enemy).roster[0];
    assert_eq!(gengar.current_hp(), gengar.max_hp());
}

#[test]
fn test_failing_handler_is_skipped_and_the_rest_still_run() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Rattata, 50))
        .enemy(TestCombatantBuilder::new(Species::Pidgey, 50))
        .build();
    start(&mut battle);

    // A held item wrongly owned by a side: its handler errors.
    let broken_seq = battle.state.next_modifier_seq();
    let tailwind_seq = battle.state.next_modifier_seq();
    let side = battle.state.side_mut(SideId::Player);
    side.modifiers.push(Modifier::new(
        ModifierKind::Held(HeldItem::Leftovers),
        ModifierOwner::Side(SideId::Player),
        broken_seq,
    ));
    side.modifiers.push(
        Modifier::new(
            ModifierKind::Tailwind,
            ModifierOwner::Side(SideId::Player),
            tailwind_seq,
        )
        .with_stacks(3),
    );

    let publication = triggers::publish(&mut battle, TriggerEvent::TurnEnd, &TriggerPayload::TurnEnd);
    assert_eq!(publication.handlers_run, 2);
    assert!(publication.applied);
    assert_eq!(
        battle
            .state()
            .side(SideId::Player)
            .side_modifier_stacks(ModifierKind::Tailwind),
        2
    );
    assert!(!battle.triggers.is_publishing(TriggerEvent::TurnEnd));
}

#[test]
fn test_reentrant_publish_is_refused() {
    let mut battle = TestBattleBuilder::new()
        .player(
            TestCombatantBuilder::new(Species::Rattata, 50)
                .with_moves(vec![Move::Tackle])
                .with_item(HeldItem::ChoiceBand),
        )
        .enemy(TestCombatantBuilder::new(Species::Pidgey, 50))
        .build();
    start(&mut battle);
    let payload = TriggerPayload::Move(MoveContext {
        user: player(0),
        target: Some(enemy(0)),
        move_used: Move::Tackle,
        move_type: PokemonType::Normal,
        category: MoveCategory::Physical,
    });

    assert_eq!(
        triggers::publish(&mut battle, TriggerEvent::ModifyDamage, &payload).multiplier(),
        1.5
    );

    assert!(battle.triggers.enter(TriggerEvent::ModifyDamage));
    let nested = triggers::publish(&mut battle, TriggerEvent::ModifyDamage, &payload);
    assert_eq!(nested.handlers_run, 0);
    assert_eq!(nested.multiplier(), 1.0);
    battle.triggers.exit(TriggerEvent::ModifyDamage);

    assert_eq!(
        triggers::publish(&mut battle, TriggerEvent::ModifyDamage, &payload).multiplier(),
        1.5
    );
}

#[test]
fn test_sitrus_berry_is_consumed_once() {
    let mut battle = TestBattleBuilder::new()
        .player(
            TestCombatantBuilder::new(Species::Chansey, 50)
                .with_moves(vec![Move::Splash])
                .with_item(HeldItem::SitrusBerry)
                .with_hp(160),
        )
        .enemy(TestCombatantBuilder::new(Species::Rattata, 20).with_moves(vec![Move::Tackle]))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);

    let events = battle.take_events();
    assert_eq!(
        count_events(&events, |e| matches!(
            e,
            BattleEvent::ItemConsumed {
                item: HeldItem::SitrusBerry,
                ..
            }
        )),
        1
    );
    let chansey = &battle.state().side(SideId::Player).roster[0];
    assert_eq!(chansey.held_item(), None);
}

#[test]
fn test_moxie_boosts_after_a_knockout() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Gyarados, 50).with_moves(vec![Move::Tackle]))
        .enemy(
            TestCombatantBuilder::new(Species::Magikarp, 5)
                .with_moves(vec![Move::Splash])
                .with_hp(1),
        )
        .enemy(TestCombatantBuilder::new(Species::Magikarp, 5).with_moves(vec![Move::Splash]))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);

    let gyarados = &battle.state().side(SideId::Player).roster[0];
    assert_eq!(gyarados.stat_stage(StatType::Atk), 1);
}
