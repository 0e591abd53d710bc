//! Rule checks played through the public intent API.
//!
//! Each test builds a small hand-placed match and drives it with intents
//! only, the same way a command source would.

use tactics_core::abilities::AbilityTarget;
use tactics_core::data::{GameRules, UnitStats, UnitTable};
use tactics_core::events::GameEvent;
use tactics_core::factions::FactionId;
use tactics_core::math::GridPos;
use tactics_core::player_facade::{event_for_viewer, event_visible_to, Intent};
use tactics_core::unit_kind::UnitKind;
use tactics_test_utils::fixtures::{nth_unit, MatchBuilder};

fn tweak(rules: &mut GameRules, kind: UnitKind, edit: impl FnOnce(&mut UnitStats)) {
    let mut stats: Vec<UnitStats> = rules.units.iter().copied().collect();
    edit(&mut stats[kind.index()]);
    rules.units = UnitTable::new(stats).unwrap();
}

#[test]
fn hit_reduces_hp_by_attack_minus_defense() {
    let mut game = MatchBuilder::plains(8, 5)
        .unit(FactionId::Blue, UnitKind::Warrior, 3, 2)
        .unit(FactionId::Red, UnitKind::Healer, 4, 2)
        .rules(|rules| tweak(rules, UnitKind::Healer, |healer| healer.defense = 0))
        .build(1);
    let warrior = nth_unit(FactionId::Blue, 0);
    let healer = nth_unit(FactionId::Red, 0);

    let events = game
        .apply(Intent::Attack {
            unit: warrior,
            target: healer,
        })
        .unwrap();

    assert_eq!(
        events[0],
        GameEvent::Damaged {
            source: Some(warrior),
            target: healer,
            amount: 6,
            remaining: 9,
            retaliation: false,
        }
    );
    // Healer strikes back for the 1 damage floor.
    assert_eq!(
        events[1],
        GameEvent::Damaged {
            source: Some(healer),
            target: warrior,
            amount: 1,
            remaining: 24,
            retaliation: true,
        }
    );
    assert_eq!(game.unit(healer).unwrap().hp(), 9);
}

#[test]
fn kill_grants_victim_experience_and_levels_up() {
    let mut game = MatchBuilder::plains(8, 5)
        .unit(FactionId::Blue, UnitKind::Warrior, 3, 2)
        .unit(FactionId::Red, UnitKind::Scout, 4, 2)
        .rules(|rules| {
            tweak(rules, UnitKind::Scout, |scout| {
                scout.max_hp = 6;
                scout.xp_value = 20;
            });
        })
        .build(1);
    let warrior = nth_unit(FactionId::Blue, 0);
    let scout = nth_unit(FactionId::Red, 0);

    let events = game
        .apply(Intent::Attack {
            unit: warrior,
            target: scout,
        })
        .unwrap();

    assert!(events.contains(&GameEvent::Killed {
        unit: scout,
        by: Some(warrior)
    }));
    assert!(events.contains(&GameEvent::ExperienceGained {
        unit: warrior,
        amount: 20
    }));
    assert!(events.contains(&GameEvent::LeveledUp {
        unit: warrior,
        level: 2
    }));

    let warrior = game.unit(warrior).unwrap();
    assert_eq!(warrior.level(), 2);
    assert_eq!(warrior.max_hp(), 30);
    assert_eq!(warrior.attack(), 7);

    let scout = game.unit(scout).unwrap();
    assert!(!scout.is_alive());
    assert_eq!(scout.hp(), 0);
    assert!(game.unit_at(GridPos::new(4, 2)).is_none());
}

#[test]
fn reachable_set_is_diamond_minus_occupied_cells() {
    let game = MatchBuilder::plains(11, 11)
        .unit(FactionId::Blue, UnitKind::Warrior, 5, 5)
        .unit(FactionId::Blue, UnitKind::Archer, 8, 5)
        .build(1);
    let warrior = nth_unit(FactionId::Blue, 0);
    let start = GridPos::new(5, 5);

    let cells = game.query_reachable(warrior).unwrap();
    assert_eq!(cells.len(), 24);
    assert!(cells.contains(&start));
    assert!(!cells.contains(&GridPos::new(8, 5)));
    assert!(cells.iter().all(|cell| cell.manhattan(start) <= 3));
}

#[test]
fn stunned_unit_cannot_move_on_its_turn() {
    let mut game = MatchBuilder::plains(9, 7)
        .unit(FactionId::Blue, UnitKind::Knight, 3, 3)
        .unit(FactionId::Red, UnitKind::Warrior, 4, 3)
        .build(2);
    let knight = nth_unit(FactionId::Blue, 0);
    let warrior = nth_unit(FactionId::Red, 0);

    game.apply(Intent::Ability {
        unit: knight,
        target: AbilityTarget::Unit(warrior),
    })
    .unwrap();
    game.apply(Intent::EndTurn).unwrap();

    assert_eq!(game.active(), FactionId::Red);
    let cells = game.query_reachable(warrior).unwrap();
    assert_eq!(cells.into_iter().collect::<Vec<_>>(), vec![GridPos::new(4, 3)]);
    assert!(!game.unit(warrior).unwrap().can_act());

    let hash = game.state_hash();
    assert!(game
        .apply(Intent::Move {
            unit: warrior,
            to: GridPos::new(5, 3),
        })
        .is_err());
    assert_eq!(game.state_hash(), hash);
}

#[test]
fn destroying_the_base_ends_the_match() {
    let mut game = MatchBuilder::plains(6, 4)
        .unit(FactionId::Blue, UnitKind::Warrior, 4, 3)
        .rules(|rules| tweak(rules, UnitKind::Base, |base| base.max_hp = 4))
        .build(3);
    let warrior = nth_unit(FactionId::Blue, 0);
    let red_base = tactics_core::unit::UnitId::new(FactionId::Red, 1);

    let events = game
        .apply(Intent::Attack {
            unit: warrior,
            target: red_base,
        })
        .unwrap();

    assert_eq!(
        events.last(),
        Some(&GameEvent::MatchWon {
            winner: FactionId::Blue
        })
    );
    assert!(game.is_over());
    assert_eq!(game.winner(), Some(FactionId::Blue));
    assert_eq!(game.check_winner(), Some(FactionId::Blue));
    assert_eq!(
        game.apply(Intent::EndTurn).unwrap_err().code(),
        "action_unavailable"
    );
    // The match does not hand the turn to anyone.
    assert_eq!(game.active(), FactionId::Blue);
}

#[test]
fn enemy_walking_out_of_sight_hides_its_destination() {
    let mut game = MatchBuilder::plains(15, 3)
        .unit(FactionId::Blue, UnitKind::Warrior, 2, 1)
        .unit(FactionId::Red, UnitKind::Scout, 4, 1)
        .build(4);
    let scout = nth_unit(FactionId::Red, 0);
    let from = GridPos::new(4, 1);
    let to = GridPos::new(9, 1);
    assert!(game.is_visible_to(FactionId::Blue, from));

    game.apply(Intent::EndTurn).unwrap();
    let events = game.apply(Intent::Move { unit: scout, to }).unwrap();
    let moved = &events[0];
    assert!(matches!(moved, GameEvent::Moved { .. }));
    assert!(!game.is_visible_to(FactionId::Blue, to));

    assert!(!event_visible_to(&game, FactionId::Blue, moved));
    let shown = event_for_viewer(&game, FactionId::Blue, moved).unwrap();
    assert_eq!(shown, GameEvent::LeftView { unit: scout, from });
    assert!(!shown.to_string().contains(&to.to_string()));

    // The owner still sees its own move in full.
    assert_eq!(event_for_viewer(&game, FactionId::Red, moved).as_ref(), Some(moved));
}
