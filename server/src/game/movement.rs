//! Lane-following movement, chase steering and crowd separation.

use std::collections::VecDeque;

use crate::game::{
    constants::*,
    layout::{self, MAP_CENTER},
    types::{EntityId, MatchState, Position, Route, RouteTarget, SlotId, Unit},
};

/// Read-only view of everything a unit may react to this tick.
struct Field {
    units: Vec<(SlotId, EntityId, Position)>,
    buildings: Vec<(SlotId, EntityId, Position, f64)>,
}

impl Field {
    fn capture(state: &MatchState) -> Self {
        let units = state
            .slots
            .iter()
            .flat_map(|s| s.living_units())
            .map(|u| (u.owner, u.id, u.position))
            .collect();
        let buildings = state
            .slots
            .iter()
            .flat_map(|s| s.buildings())
            .filter(|b| b.is_alive())
            .map(|b| (b.owner, b.id, b.position, b.kind.profile().target_weight))
            .collect();
        Field { units, buildings }
    }

    fn nearest_enemy_unit(&self, owner: SlotId, from: Position) -> Option<(EntityId, Position, f64)> {
        self.units
            .iter()
            .filter(|(o, _, _)| *o != owner)
            .map(|(_, id, p)| (*id, *p, p.distance_to(from)))
            .min_by(|a, b| a.2.total_cmp(&b.2))
    }

    fn enemy_building_within(&self, owner: SlotId, from: Position, radius: f64) -> bool {
        self.buildings
            .iter()
            .any(|(o, _, p, _)| *o != owner && p.distance_to(from) <= radius)
    }

    fn unit_position(&self, id: EntityId) -> Option<Position> {
        self.units.iter().find(|(_, u, _)| *u == id).map(|(_, _, p)| *p)
    }

    fn building_alive(&self, id: EntityId) -> bool {
        self.buildings.iter().any(|(_, b, _, _)| *b == id)
    }

    /// Highest-value enemy building, discounted by distance.
    fn preferred_enemy_building(&self, owner: SlotId, from: Position) -> Option<(EntityId, Position)> {
        self.buildings
            .iter()
            .filter(|(o, _, _, _)| *o != owner)
            .map(|(_, id, p, w)| (*id, *p, p.distance_to(from) / w))
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(id, p, _)| (id, p))
    }
}

/// New route for a unit whose target vanished or whose lane is exhausted.
///
/// Priority: nearest enemy unit, then the most attractive enemy building,
/// then the lane patrol, then the map center.
fn fallback_route(unit: &Unit, field: &Field) -> Route {
    let lane = unit.route.lane;
    let direct = |destination: Position, target: RouteTarget| Route {
        waypoints: VecDeque::new(),
        destination: Some(destination),
        lane,
        target,
    };

    if let Some((id, pos, _)) = field.nearest_enemy_unit(unit.owner, unit.position) {
        return direct(pos, RouteTarget::Unit(id));
    }
    if let Some((id, pos)) = field.preferred_enemy_building(unit.owner, unit.position) {
        return direct(pos, RouteTarget::Building(id));
    }
    let patrol = layout::patrol_point(lane, unit.position);
    if patrol.distance_to(unit.position) > ARRIVAL_RADIUS {
        return direct(patrol, RouteTarget::Point);
    }
    direct(MAP_CENTER, RouteTarget::Point)
}

/// Re-targets a route whose entity target died and tracks moving unit targets.
fn refresh_route(unit: &mut Unit, field: &Field) {
    match unit.route.target {
        RouteTarget::Unit(id) => match field.unit_position(id) {
            Some(pos) => unit.route.destination = Some(pos),
            None => unit.route = fallback_route(unit, field),
        },
        RouteTarget::Building(id) if !field.building_alive(id) => {
            unit.route = fallback_route(unit, field);
        }
        _ => {}
    }
}

fn step_unit(unit: &mut Unit, field: &Field, dt: f64) {
    let step = unit.speed * dt;
    let engage_radius = DETECTION_RADIUS.min(unit.effective_range());

    let nearest = field.nearest_enemy_unit(unit.owner, unit.position);
    if nearest.is_some_and(|(_, _, d)| d <= engage_radius)
        || field.enemy_building_within(unit.owner, unit.position, SIEGE_DISTANCE)
    {
        unit.is_moving = false;
        return;
    }

    unit.is_moving = true;
    if let Some((_, pos, d)) = nearest {
        if d <= DETECTION_RADIUS {
            unit.position = unit.position.step_toward(pos, step).clamped();
            return;
        }
    }

    refresh_route(unit, field);
    let Some(target) = unit.route.current() else {
        unit.route = fallback_route(unit, field);
        return;
    };
    if unit.position.distance_to(target) <= ARRIVAL_RADIUS {
        unit.route.advance();
        if unit.route.is_exhausted() {
            unit.route = fallback_route(unit, field);
        }
        return;
    }
    unit.position = unit.position.step_toward(target, step).clamped();
}

/// Moves every living unit by one tick of `dt` game seconds.
pub fn advance(state: &mut MatchState, dt: f64) {
    let field = Field::capture(state);
    for slot in state.slots.iter_mut() {
        for unit in slot.units.iter_mut().filter(|u| u.is_alive()) {
            step_unit(unit, &field, dt);
        }
    }
}

fn separation_push(id: EntityId, pos: Position, neighbours: &[(EntityId, Position)]) -> (f64, f64) {
    let mut push = (0.0, 0.0);
    for (other_id, other) in neighbours {
        if *other_id == id {
            continue;
        }
        let d = pos.distance_to(*other);
        if d >= MIN_UNIT_SPACING {
            continue;
        }
        let overlap = (MIN_UNIT_SPACING - d) * 0.5;
        let (dx, dy) = if d > f64::EPSILON {
            ((pos.x - other.x) / d, (pos.y - other.y) / d)
        } else {
            // golden-angle spread keeps stacked units from sharing a direction
            let angle = id as f64 * 2.399_963;
            (angle.cos(), angle.sin())
        };
        push.0 += dx * overlap;
        push.1 += dy * overlap;
    }
    let magnitude = push.0.hypot(push.1);
    if magnitude > MAX_SEPARATION_PUSH {
        let k = MAX_SEPARATION_PUSH / magnitude;
        push = (push.0 * k, push.1 * k);
    }
    push
}

/// Pushes overlapping units apart, bounded per tick and kept on the map.
pub fn separate(state: &mut MatchState) {
    let positions: Vec<(EntityId, Position)> = state
        .slots
        .iter()
        .flat_map(|s| s.living_units())
        .map(|u| (u.id, u.position))
        .collect();
    for unit in state
        .slots
        .iter_mut()
        .flat_map(|s| s.units.iter_mut())
        .filter(|u| u.is_alive())
    {
        let (dx, dy) = separation_push(unit.id, unit.position, &positions);
        unit.position = Position::new(unit.position.x + dx, unit.position.y + dy).clamped();
    }
}
