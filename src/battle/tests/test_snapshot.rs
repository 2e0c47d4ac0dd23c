use super::common::*;
use crate::battle::engine::{Battle, RunStatus};
use crate::battle::snapshot::{BattleSnapshot, SNAPSHOT_VERSION};
use crate::errors::SnapshotError;
use pretty_assertions::assert_eq;
use schema::{Move, Species};
use std::sync::Arc;

fn mid_battle() -> Battle {
    let mut battle = TestBattleBuilder::new()
        .seed(2024)
        .player(
            TestCombatantBuilder::new(Species::Gengar, 50)
                .with_moves(vec![Move::FutureSight, Move::Tackle]),
        )
        .player(TestCombatantBuilder::new(Species::Onix, 50))
        .enemy(TestCombatantBuilder::new(Species::Chansey, 50).with_moves(vec![Move::Tackle]))
        .enemy(TestCombatantBuilder::new(Species::Rattata, 40))
        .build();
    start(&mut battle);
    play_turn(&mut battle, vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)]);
    battle.take_events();
    battle
}

#[test]
fn test_binary_round_trip_is_byte_identical() {
    let battle = mid_battle();
    let bytes = BattleSnapshot::capture(&battle).to_bytes().unwrap();

    let restored = BattleSnapshot::from_bytes(&bytes)
        .unwrap()
        .restore(Arc::new(battle.dex().clone()))
        .unwrap();
    assert_eq!(BattleSnapshot::capture(&restored).to_bytes().unwrap(), bytes);
    assert_eq!(restored.state(), battle.state());
    assert_eq!(restored.state().positional_tags.len(), 1);
}

#[test]
fn test_restored_battle_continues_identically() {
    let mut original = mid_battle();
    let snapshot = BattleSnapshot::capture(&original);
    let json = snapshot.to_json().unwrap();
    let mut restored = BattleSnapshot::from_json(&json)
        .unwrap()
        .restore(Arc::new(original.dex().clone()))
        .unwrap();
    assert_eq!(restored.run().unwrap(), RunStatus::AwaitingCommands);
    restored.take_events();

    for _ in 0..2 {
        let choices = vec![use_move(PLAYER_0, 1), use_move(ENEMY_0, 0)];
        let a = play_turn(&mut original, choices.clone());
        let b = play_turn(&mut restored, choices);
        assert_eq!(a, b);
        assert_eq!(original.take_events(), restored.take_events());
        assert_eq!(original.rng_state(), restored.rng_state());
        if a != RunStatus::AwaitingCommands {
            break;
        }
    }
}

#[test]
fn test_unknown_version_is_rejected() {
    let battle = mid_battle();
    let mut snapshot = BattleSnapshot::capture(&battle);
    snapshot.version = SNAPSHOT_VERSION + 1;
    let json = snapshot.to_json().unwrap();

    match BattleSnapshot::from_json(&json) {
        Err(SnapshotError::Version { found, expected }) => {
            assert_eq!(found, SNAPSHOT_VERSION + 1);
            assert_eq!(expected, SNAPSHOT_VERSION);
        }
        other => panic!("expected a version error, got {:?}", other.map(|s| s.version)),
    }
}

#[test]
fn test_inconsistent_field_is_rejected() {
    let battle = mid_battle();
    let mut snapshot = BattleSnapshot::capture(&battle);
    // The slot claims the benched Onix while Gengar thinks it stands there.
    snapshot.state.sides[0].field[0] = Some(1);

    let dex = Arc::new(battle.dex().clone());
    assert!(matches!(
        snapshot.restore(dex),
        Err(SnapshotError::Inconsistent(_))
    ));
}

#[test]
fn test_invalid_config_is_rejected_on_restore() {
    let battle = mid_battle();
    let mut snapshot = BattleSnapshot::capture(&battle);
    snapshot.config.capture.shake_checks = 0;
    let json = snapshot.to_json().unwrap();

    let dex = Arc::new(battle.dex().clone());
    assert!(matches!(
        BattleSnapshot::from_json(&json).unwrap().restore(dex),
        Err(SnapshotError::Config(_))
    ));
}

#[test]
fn test_garbage_bytes_are_a_codec_error() {
    assert!(matches!(
        BattleSnapshot::from_bytes(&[0xff, 0xff, 0xff]),
        Err(SnapshotError::Binary(_))
    ));
}
