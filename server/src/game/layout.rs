//! Fixed map geometry: base placement, lane routes and patrol points.
//!
//! Slots sit in the four corners, numbered clockwise from the top-left
//! (y grows downward). Every slot fields three lanes: the center lane runs
//! through the middle of the map toward the opposite corner, the two side
//! lanes follow the map edges toward the clockwise and counter-clockwise
//! neighbours.

use std::collections::VecDeque;

use crate::game::{
    constants::*,
    types::{
        Building, BuildingKind, Lane, MatchState, PlayerSlot, Position, Route, RouteTarget,
        SlotId, Upgrades,
    },
};

const CORNER_INSET: f64 = 80.0;
const BARRACKS_OFFSET: f64 = 90.0;
const TOWER_DISTANCES: [f64; 2] = [150.0, 210.0];
const TOWER_SPREAD: f64 = 40.0;

pub const MAP_CENTER: Position = Position::new(MAP_SIZE / 2.0, MAP_SIZE / 2.0);

pub fn castle_position(slot: SlotId) -> Position {
    let far = MAP_SIZE - CORNER_INSET;
    match slot % SLOT_COUNT as SlotId {
        0 => Position::new(CORNER_INSET, CORNER_INSET),
        1 => Position::new(far, CORNER_INSET),
        2 => Position::new(far, far),
        _ => Position::new(CORNER_INSET, far),
    }
}

pub fn clockwise_neighbour(slot: SlotId) -> SlotId {
    (slot + 1) % SLOT_COUNT as SlotId
}

pub fn counter_clockwise_neighbour(slot: SlotId) -> SlotId {
    (slot + SLOT_COUNT as SlotId - 1) % SLOT_COUNT as SlotId
}

pub fn opposite(slot: SlotId) -> SlotId {
    (slot + 2) % SLOT_COUNT as SlotId
}

/// Slot whose castle the given lane of `slot` marches on.
pub fn lane_target(slot: SlotId, lane: Lane) -> SlotId {
    match lane {
        Lane::Center => opposite(slot),
        Lane::Clockwise => clockwise_neighbour(slot),
        Lane::CounterClockwise => counter_clockwise_neighbour(slot),
    }
}

fn unit_vector(from: Position, to: Position) -> (f64, f64) {
    let d = from.distance_to(to);
    if d == 0.0 {
        return (0.0, 0.0);
    }
    ((to.x - from.x) / d, (to.y - from.y) / d)
}

fn offset(origin: Position, dir: (f64, f64), along: f64, across: f64) -> Position {
    // perpendicular = (-dy, dx)
    Position::new(
        origin.x + dir.0 * along - dir.1 * across,
        origin.y + dir.1 * along + dir.0 * across,
    )
    .clamped()
}

pub const LANES: [Lane; 3] = [Lane::Center, Lane::Clockwise, Lane::CounterClockwise];

pub fn barracks_position(slot: SlotId, lane: Lane) -> Position {
    let castle = castle_position(slot);
    let toward = castle_position(lane_target(slot, lane));
    offset(castle, unit_vector(castle, toward), BARRACKS_OFFSET, 0.0)
}

/// Lane route from a slot's base to the castle the lane is aimed at.
pub fn lane_route(slot: SlotId, lane: Lane) -> Route {
    let target_slot = lane_target(slot, lane);
    let start = castle_position(slot);
    let goal = castle_position(target_slot);
    let mut waypoints = VecDeque::new();
    match lane {
        Lane::Center => waypoints.push_back(MAP_CENTER),
        Lane::Clockwise | Lane::CounterClockwise => waypoints.push_back(Position::new(
            (start.x + goal.x) / 2.0,
            (start.y + goal.y) / 2.0,
        )),
    }
    Route {
        waypoints,
        destination: Some(goal),
        lane,
        target: RouteTarget::Point,
    }
}

/// Next patrol point once a unit has nothing left to chase.
///
/// Center-lane units rotate clockwise through the corners; side-lane units
/// keep rotating in their lane's direction.
pub fn patrol_point(lane: Lane, from: Position) -> Position {
    let nearest = (0..SLOT_COUNT as SlotId)
        .min_by(|a, b| {
            castle_position(*a)
                .distance_to(from)
                .total_cmp(&castle_position(*b).distance_to(from))
        })
        .unwrap_or(0);
    let next = match lane {
        Lane::Center | Lane::Clockwise => clockwise_neighbour(nearest),
        Lane::CounterClockwise => counter_clockwise_neighbour(nearest),
    };
    castle_position(next)
}

/// Terrain line-of-sight hook. The map currently carries no terrain.
pub fn blocks_line_of_sight(_from: Position, _to: Position) -> bool {
    false
}

/// Creates one slot's starting base, allocating entity ids from `state`.
pub fn build_slot(state: &mut MatchState, id: SlotId, is_bot: bool) -> PlayerSlot {
    let castle_pos = castle_position(id);
    let castle = Building::new(state.alloc_id(), id, BuildingKind::Castle, castle_pos);

    let barracks = LANES
        .iter()
        .map(|&lane| Building::barracks(state.alloc_id(), id, barracks_position(id, lane), lane))
        .collect();

    let mut towers = Vec::with_capacity(6);
    for lane in LANES {
        let dir = unit_vector(castle_pos, castle_position(lane_target(id, lane)));
        for (i, along) in TOWER_DISTANCES.iter().enumerate() {
            let across = if i % 2 == 0 { TOWER_SPREAD } else { -TOWER_SPREAD };
            towers.push(Building::new(
                state.alloc_id(),
                id,
                BuildingKind::Tower,
                offset(castle_pos, dir, *along, across),
            ));
        }
    }

    PlayerSlot {
        id,
        gold: STARTING_GOLD,
        gold_income: BASE_GOLD_INCOME,
        castle,
        barracks,
        towers,
        units: Vec::new(),
        upgrades: Upgrades::default(),
        is_active: true,
        is_bot,
        auto_progression: false,
        stats: Default::default(),
    }
}
