use super::common::*;
use crate::battle::engine::RunStatus;
use crate::battle::state::{BattleEvent, BattleOutcome, DamageSource, SideId};
use pretty_assertions::assert_eq;
use schema::{Move, Species};

fn mirror_match() -> TestBattleBuilder {
    TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Rattata, 50).with_moves(vec![Move::Tackle]))
        .enemy(TestCombatantBuilder::new(Species::Rattata, 50).with_moves(vec![Move::Tackle]))
}

#[test]
fn test_opening_lineup_is_sent_out() {
    let mut battle = mirror_match().build();
    let events = battle.events().to_vec();
    assert_eq!(
        count_events(&events, |e| matches!(e, BattleEvent::SwitchedIn { .. })),
        2
    );

    assert_eq!(battle.run().unwrap(), RunStatus::AwaitingCommands);
    assert_eq!(battle.state().turn, 1);
    assert!(battle
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::TurnStarted { turn: 1 })));
}

#[test]
fn test_speed_tie_follows_the_tiebreak_draw() {
    // The first draw of turn one shuffles the two field slots.
    // 0 keeps the player's slot first, 1 swaps it behind the enemy's.
    for (draw, expected) in [(0, player(0)), (1, enemy(0))] {
        let mut battle = mirror_match().scripted(vec![draw]).build();
        start(&mut battle);
        play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
        let events = battle.take_events();
        assert_eq!(first_mover(&events), Some(expected), "tiebreak draw {}", draw);
    }
}

#[test]
fn test_priority_beats_speed() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Onix, 50).with_moves(vec![Move::QuickAttack]))
        .enemy(TestCombatantBuilder::new(Species::Gengar, 50).with_moves(vec![Move::Splash]))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
    let events = battle.take_events();
    assert_eq!(first_mover(&events), Some(player(0)));
}

#[test]
fn test_a_full_turn_advances_the_counter_and_spends_pp() {
    let mut battle = mirror_match().build();
    start(&mut battle);
    let status = play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
    assert_eq!(status, RunStatus::AwaitingCommands);

    let events = battle.take_events();
    assert_eq!(battle.state().turn, 2);
    assert!(events
        .iter()
        .any(|e| matches!(e, BattleEvent::TurnEnded { turn: 1 })));
    assert!(events
        .iter()
        .any(|e| matches!(e, BattleEvent::TurnStarted { turn: 2 })));
    for side in SideId::BOTH {
        let rattata = &battle.state().side(side).roster[0];
        assert_eq!(rattata.moves[0].pp, 34);
        assert!(rattata.current_hp() < rattata.max_hp());
    }
    assert_eq!(
        damage_to(&events, enemy(0), DamageSource::Move(Move::Tackle)).len(),
        1
    );
}

#[test]
fn test_same_seed_replays_the_same_battle() {
    let play = |seed: u64| {
        let mut battle = mirror_match().seed(seed).build();
        start(&mut battle);
        let mut log = Vec::new();
        for _ in 0..3 {
            if play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)])
                != RunStatus::AwaitingCommands
            {
                break;
            }
            log.extend(battle.take_events());
        }
        log
    };
    assert_eq!(play(42), play(42));
}

#[test]
fn test_last_faint_is_reported_before_the_battle_ends() {
    let mut battle = TestBattleBuilder::new()
        .player(TestCombatantBuilder::new(Species::Kangaskhan, 50).with_moves(vec![Move::Tackle]))
        .enemy(
            TestCombatantBuilder::new(Species::Magikarp, 5)
                .with_moves(vec![Move::Splash])
                .with_hp(1),
        )
        .build();
    start(&mut battle);
    let status = play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
    assert_eq!(status, RunStatus::Ended(BattleOutcome::Victory(SideId::Player)));

    let events = battle.take_events();
    let fainted = events
        .iter()
        .position(|e| matches!(e, BattleEvent::Fainted { combatant, .. } if *combatant == enemy(0)))
        .expect("faint should be reported");
    let ended = events
        .iter()
        .position(|e| matches!(e, BattleEvent::BattleEnded { .. }))
        .expect("end should be reported");
    assert!(fainted < ended);
    // The fainted combatant's queued move was dropped.
    assert!(!events
        .iter()
        .any(|e| matches!(e, BattleEvent::MoveUsed { user, .. } if *user == enemy(0))));
    assert_eq!(battle.outcome(), Some(BattleOutcome::Victory(SideId::Player)));
    assert_eq!(battle.run().unwrap(), status);
}
