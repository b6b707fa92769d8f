//! Per-tick damage resolution: unit duels, building fire and siege.
//!
//! All distance checks use positions captured at the start of the tick so
//! the outcome never depends on which unit is visited first.

use std::collections::BTreeSet;

use crate::game::{
    constants::*,
    layout,
    types::{damage, BuildingKind, EntityId, MatchState, Position, SlotId, UnitClass},
};

/// Living unit as seen at the start of the tick.
#[derive(Debug, Clone, Copy)]
struct Entry {
    slot: usize,
    idx: usize,
    owner: SlotId,
    position: Position,
}

/// Summary of what happened in one resolution pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CombatReport {
    pub units_killed: Vec<EntityId>,
    pub buildings_destroyed: Vec<EntityId>,
}

fn roster(state: &MatchState) -> Vec<Entry> {
    state
        .slots
        .iter()
        .enumerate()
        .flat_map(|(slot, s)| {
            s.units
                .iter()
                .enumerate()
                .filter(|(_, u)| u.is_alive())
                .map(move |(idx, u)| Entry {
                    slot,
                    idx,
                    owner: u.owner,
                    position: u.position,
                })
        })
        .collect()
}

fn alive(state: &MatchState, e: &Entry) -> bool {
    state.slots[e.slot].units[e.idx].is_alive()
}

/// Nearest living enemy of `owner` within `radius` of `from`.
fn nearest_enemy(
    state: &MatchState,
    roster: &[Entry],
    owner: SlotId,
    from: Position,
    radius: f64,
) -> Option<(Entry, f64)> {
    roster
        .iter()
        .filter(|e| e.owner != owner && alive(state, e))
        .filter(|e| !layout::blocks_line_of_sight(from, e.position))
        .map(|e| (*e, e.position.distance_to(from)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn credit_damage(state: &mut MatchState, attacker: SlotId, victim: SlotId, amount: f64) {
    if let Some(s) = state.slot_mut(attacker) {
        s.stats.damage_dealt += amount;
    }
    if let Some(s) = state.slot_mut(victim) {
        s.stats.damage_taken += amount;
    }
}

fn credit_unit_kill(state: &mut MatchState, killer: SlotId, victim: SlotId, class: UnitClass) {
    let bounty = class.profile().bounty;
    if let Some(s) = state.slot_mut(killer) {
        s.gold += bounty;
        s.stats.gold_earned += u64::from(bounty);
        s.stats.kills += 1;
    }
    if let Some(s) = state.slot_mut(victim) {
        s.stats.losses += 1;
    }
}

/// Applies `attack` to the unit at `target`; returns `true` on a kill.
fn strike_unit(
    state: &mut MatchState,
    attacker: SlotId,
    attack: f64,
    target: &Entry,
    report: &mut CombatReport,
) -> bool {
    let unit = &mut state.slots[target.slot].units[target.idx];
    let before = unit.health;
    unit.health = (unit.health - damage(attack, unit.defense)).max(0.0);
    let dealt = before - unit.health;
    let killed = unit.health <= 0.0;
    let (victim, class, id) = (unit.owner, unit.class, unit.id);

    credit_damage(state, attacker, victim, dealt);
    if killed {
        credit_unit_kill(state, attacker, victim, class);
        report.units_killed.push(id);
    }
    killed
}

/// Unit-versus-unit exchanges, including same-exchange retaliation.
fn resolve_duels(state: &mut MatchState, roster: &[Entry], now: f64, report: &mut CombatReport) {
    for a in roster {
        let attacker = &state.slots[a.slot].units[a.idx];
        if !attacker.is_alive() || attacker.is_moving || !attacker.ready_to_attack(now) {
            continue;
        }
        let reach = DETECTION_RADIUS.min(attacker.effective_range());
        let attack = attacker.attack;
        let Some((d, dist)) = nearest_enemy(state, roster, a.owner, a.position, reach) else {
            continue;
        };

        let defender_id = state.slots[d.slot].units[d.idx].id;
        {
            let attacker = &mut state.slots[a.slot].units[a.idx];
            attacker.last_attack_time = Some(now);
            attacker.attack_target = Some(defender_id);
        }
        if strike_unit(state, a.owner, attack, &d, report) {
            continue;
        }

        let defender = &state.slots[d.slot].units[d.idx];
        if defender.effective_range() < dist || !defender.ready_to_attack(now) {
            continue;
        }
        let counter = defender.attack;
        let attacker_id = state.slots[a.slot].units[a.idx].id;
        {
            let defender = &mut state.slots[d.slot].units[d.idx];
            defender.last_attack_time = Some(now);
            defender.attack_target = Some(attacker_id);
        }
        strike_unit(state, d.owner, counter, a, report);
    }
}

/// Castles and towers shoot the nearest enemy unit in range.
fn resolve_building_fire(
    state: &mut MatchState,
    roster: &[Entry],
    now: f64,
    report: &mut CombatReport,
) {
    for slot in 0..state.slots.len() {
        let shooters: Vec<(EntityId, SlotId, Position, f64, f64)> = state.slots[slot]
            .buildings()
            .filter(|b| b.is_alive())
            .filter_map(|b| {
                let arm = b.armament.as_ref()?;
                (arm.attack > 0.0 && arm.ready(now))
                    .then_some((b.id, b.owner, b.position, arm.attack, arm.range))
            })
            .collect();

        for (id, owner, position, attack, range) in shooters {
            let Some((target, _)) = nearest_enemy(state, roster, owner, position, range) else {
                continue;
            };
            if let Some(arm) = state.slots[slot]
                .building_mut(id)
                .and_then(|b| b.armament.as_mut())
            {
                arm.last_attack_time = Some(now);
            }
            strike_unit(state, owner, attack, &target, report);
        }
    }
}

/// Distinct enemy slots with a unit near `position` at tick start.
fn besiegers(roster: &[Entry], owner: SlotId, position: Position) -> BTreeSet<SlotId> {
    roster
        .iter()
        .filter(|e| e.owner != owner && e.position.distance_to(position) <= SIEGE_DISTANCE)
        .map(|e| e.owner)
        .collect()
}

fn credit_building_kill(
    state: &mut MatchState,
    roster: &[Entry],
    owner: SlotId,
    kind: BuildingKind,
    position: Position,
) {
    let attackers = besiegers(roster, owner, position);
    if !attackers.is_empty() {
        let share = kind.profile().bounty / attackers.len() as u32;
        for slot in &attackers {
            if let Some(s) = state.slot_mut(*slot) {
                s.gold += share;
                s.stats.gold_earned += u64::from(share);
                s.stats.buildings_destroyed += 1;
            }
        }
    }
    if let Some(s) = state.slot_mut(owner) {
        s.stats.buildings_lost += 1;
    }
}

/// Units next to an enemy building chip away at it.
fn resolve_siege(state: &mut MatchState, roster: &[Entry], now: f64, report: &mut CombatReport) {
    let targets: Vec<(SlotId, EntityId, Position)> = state
        .slots
        .iter()
        .flat_map(|s| s.buildings())
        .filter(|b| b.is_alive())
        .map(|b| (b.owner, b.id, b.position))
        .collect();

    for a in roster {
        let unit = &state.slots[a.slot].units[a.idx];
        if !unit.is_alive() || !unit.ready_to_attack(now) {
            continue;
        }
        let attack = unit.attack;
        let target = targets
            .iter()
            .filter(|(owner, id, _)| {
                *owner != a.owner
                    && state
                        .slot(*owner)
                        .and_then(|s| s.building(*id))
                        .is_some_and(|b| b.is_alive())
            })
            .map(|(owner, id, p)| (*owner, *id, *p, p.distance_to(a.position)))
            .filter(|(_, _, _, d)| *d <= SIEGE_DISTANCE)
            .min_by(|x, y| x.3.total_cmp(&y.3));
        let Some((owner, id, position, _)) = target else {
            continue;
        };

        {
            let unit = &mut state.slots[a.slot].units[a.idx];
            unit.last_attack_time = Some(now);
            unit.attack_target = Some(id);
        }
        let Some(building) = state.slot_mut(owner).and_then(|s| s.building_mut(id)) else {
            continue;
        };
        let before = building.health;
        building.health = (building.health - damage(attack, 0.0)).max(0.0);
        let dealt = before - building.health;
        let destroyed = building.health <= 0.0;
        let kind = building.kind;

        credit_damage(state, a.owner, owner, dealt);
        if destroyed {
            log::debug!("building {id} of slot {owner} destroyed");
            credit_building_kill(state, roster, owner, kind, position);
            report.buildings_destroyed.push(id);
        }
    }
}

/// Runs one full combat pass at the current match clock.
pub fn resolve(state: &mut MatchState) -> CombatReport {
    let now = state.match_time;
    let roster = roster(state);
    let mut report = CombatReport::default();

    resolve_duels(state, &roster, now, &mut report);
    resolve_building_fire(state, &roster, now, &mut report);
    resolve_siege(state, &roster, now, &mut report);
    report
}

/// Removes units that died this tick.
pub fn sweep_dead(state: &mut MatchState) {
    for slot in state.slots.iter_mut() {
        slot.units.retain(|u| u.is_alive());
    }
}
