use std::collections::VecDeque;

use siegelane_server::game::{
    constants::{MAP_SIZE, MAX_SEPARATION_PUSH},
    layout::{self, MAP_CENTER},
    movement::{advance, separate},
    types::{EntityId, Lane, MatchState, Position, RouteTarget, SlotId, Unit, UnitClass},
};

fn place(state: &mut MatchState, owner: SlotId, class: UnitClass, x: f64, y: f64) -> EntityId {
    let id = state.alloc_id();
    let slot = state.slot_mut(owner).unwrap();
    let unit = Unit::spawn(
        id,
        owner,
        class,
        Position::new(x, y),
        layout::lane_route(owner, Lane::Center),
        &slot.upgrades,
    );
    slot.units.push(unit);
    id
}

#[test]
fn units_hold_position_when_an_enemy_is_in_reach() {
    let mut state = MatchState::new(&[]);
    let a = place(&mut state, 0, UnitClass::Melee, 400.0, 400.0);
    place(&mut state, 1, UnitClass::Melee, 420.0, 400.0);

    advance(&mut state, 0.5);

    let unit = state.unit(a).unwrap();
    assert!(!unit.is_moving);
    assert_eq!(unit.position, Position::new(400.0, 400.0));
}

#[test]
fn units_chase_detected_enemies() {
    let mut state = MatchState::new(&[]);
    let a = place(&mut state, 0, UnitClass::Melee, 400.0, 400.0);
    place(&mut state, 1, UnitClass::SlowRanged, 500.0, 400.0);

    advance(&mut state, 0.5);

    let unit = state.unit(a).unwrap();
    assert!(unit.is_moving);
    // speed 40 for half a second
    assert_eq!(unit.position, Position::new(420.0, 400.0));
}

#[test]
fn units_follow_their_lane_toward_the_center() {
    let mut state = MatchState::new(&[]);
    let a = place(&mut state, 0, UnitClass::Melee, 300.0, 300.0);
    let before = Position::new(300.0, 300.0).distance_to(MAP_CENTER);

    advance(&mut state, 1.0);

    let after = state.unit(a).unwrap().position.distance_to(MAP_CENTER);
    assert!((before - after - 40.0).abs() < 1e-9);
}

#[test]
fn exhausted_route_falls_back_to_an_enemy_building() {
    let mut state = MatchState::new(&[]);
    let a = place(&mut state, 0, UnitClass::Melee, 400.0, 400.0);
    {
        let route = &mut state.slots[0].units[0].route;
        route.waypoints = VecDeque::new();
        route.destination = None;
    }

    advance(&mut state, 0.05);

    let target = state.unit(a).unwrap().route.target;
    let RouteTarget::Building(id) = target else {
        panic!("expected a building target, got {target:?}");
    };
    assert_ne!(state.building(id).unwrap().owner, 0);
}

#[test]
fn stacked_units_are_pushed_apart_within_the_cap() {
    let mut state = MatchState::new(&[]);
    let a = place(&mut state, 0, UnitClass::Melee, 400.0, 400.0);
    let b = place(&mut state, 0, UnitClass::Melee, 400.0, 400.0);

    separate(&mut state);

    let pa = state.unit(a).unwrap().position;
    let pb = state.unit(b).unwrap().position;
    assert!(pa.distance_to(pb) > 0.0);
    assert!(pa.distance_to(Position::new(400.0, 400.0)) <= MAX_SEPARATION_PUSH + 1e-9);
    assert!(pb.distance_to(Position::new(400.0, 400.0)) <= MAX_SEPARATION_PUSH + 1e-9);
}

#[test]
fn separation_never_leaves_the_map() {
    let mut state = MatchState::new(&[]);
    for _ in 0..4 {
        place(&mut state, 3, UnitClass::Melee, 0.0, MAP_SIZE);
    }

    separate(&mut state);

    for u in &state.slot(3).unwrap().units {
        assert!((0.0..=MAP_SIZE).contains(&u.position.x));
        assert!((0.0..=MAP_SIZE).contains(&u.position.y));
    }
}
