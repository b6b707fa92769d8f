use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{constants::*, layout};

/// One of the four fixed player identities (0–3).
pub type SlotId = u8;
/// Stable id for units and buildings, unique within a match.
pub type EntityId = u64;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Moves at most `max_step` toward `target`, never overshooting.
    pub fn step_toward(self, target: Position, max_step: f64) -> Position {
        let dist = self.distance_to(target);
        if dist <= max_step || dist == 0.0 {
            return target;
        }
        let t = max_step / dist;
        Position::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }

    pub fn clamped(self) -> Position {
        Position::new(self.x.clamp(0.0, MAP_SIZE), self.y.clamp(0.0, MAP_SIZE))
    }

    /// Grid cell used by the purchase rules.
    pub fn cell(self) -> (i32, i32) {
        (
            (self.x / GRID_CELL_SIZE).floor() as i32,
            (self.y / GRID_CELL_SIZE).floor() as i32,
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum UnitClass {
    Melee,
    FastRanged,
    SlowRanged,
}

impl UnitClass {
    pub const ALL: [UnitClass; 3] = [UnitClass::Melee, UnitClass::FastRanged, UnitClass::SlowRanged];
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BuildingKind {
    Castle,
    Barracks,
    Tower,
}

/// Which of a slot's three attack lanes a barracks (and its units) belongs to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Lane {
    Center,
    Clockwise,
    CounterClockwise,
}

/// What a route is currently heading for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum RouteTarget {
    Point,
    Unit(EntityId),
    Building(EntityId),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub waypoints: VecDeque<Position>,
    pub destination: Option<Position>,
    pub lane: Lane,
    pub target: RouteTarget,
}

impl Route {
    pub fn current(&self) -> Option<Position> {
        self.waypoints.front().copied().or(self.destination)
    }

    /// Drops the reached waypoint, or the destination once waypoints run out.
    pub fn advance(&mut self) {
        if self.waypoints.pop_front().is_none() {
            self.destination = None;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.waypoints.is_empty() && self.destination.is_none()
    }
}

/// One unit on the battlefield.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: EntityId,
    pub owner: SlotId,
    pub class: UnitClass,
    pub position: Position,
    pub route: Route,
    pub health: f64,
    pub max_health: f64,
    pub attack: f64,
    pub defense: f64,
    pub speed: f64,
    pub attack_range: f64,
    pub is_moving: bool,
    pub last_attack_time: Option<f64>,
    /// Render hint only; never read by the simulation.
    pub attack_target: Option<EntityId>,
}

impl Unit {
    /// Builds a fresh unit with stats derived from the owner's upgrades.
    pub fn spawn(
        id: EntityId,
        owner: SlotId,
        class: UnitClass,
        position: Position,
        route: Route,
        upgrades: &Upgrades,
    ) -> Self {
        let p = class.profile();
        let max_health =
            (p.health * (1.0 + HEALTH_MULTIPLIER_PER_LEVEL * upgrades.health as f64)).round();
        let mut unit = Unit {
            id,
            owner,
            class,
            position,
            route,
            health: max_health,
            max_health,
            attack: p.attack,
            defense: p.defense,
            speed: p.speed,
            attack_range: p.range,
            is_moving: true,
            last_attack_time: None,
            attack_target: None,
        };
        unit.rederive(upgrades);
        unit
    }

    /// Recomputes attack and defense from class base plus upgrade levels.
    pub fn rederive(&mut self, upgrades: &Upgrades) {
        let p = self.class.profile();
        self.attack = p.attack + ATTACK_PER_LEVEL * upgrades.attack as f64;
        self.defense =
            p.defense * (1.0 + DEFENSE_MULTIPLIER_PER_LEVEL * upgrades.defense as f64);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn ready_to_attack(&self, now: f64) -> bool {
        cooldown_elapsed(self.last_attack_time, now, UNIT_ATTACK_COOLDOWN)
    }

    /// Close-combat classes always fight at the fixed melee distance.
    pub fn effective_range(&self) -> f64 {
        effective_range(self.attack_range)
    }
}

pub fn effective_range(raw: f64) -> f64 {
    if raw > RANGED_THRESHOLD {
        raw
    } else {
        MELEE_DISTANCE
    }
}

pub fn cooldown_elapsed(last: Option<f64>, now: f64, cooldown: f64) -> bool {
    last.is_none_or(|t| now - t >= cooldown)
}

pub fn damage(attack: f64, defense: f64) -> f64 {
    (attack - defense).floor().max(1.0)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Armament {
    pub attack: f64,
    pub range: f64,
    pub last_attack_time: Option<f64>,
}

impl Armament {
    pub fn ready(&self, now: f64) -> bool {
        cooldown_elapsed(self.last_attack_time, now, BUILDING_ATTACK_COOLDOWN)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BarracksState {
    pub lane: Lane,
    pub spawn_timer: f64,
    pub available_units: u32,
    pub restore_timer: f64,
    pub last_purchase_time: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: EntityId,
    pub owner: SlotId,
    pub kind: BuildingKind,
    pub position: Position,
    pub level: u32,
    pub health: f64,
    pub max_health: f64,
    pub armament: Option<Armament>,
    pub barracks: Option<BarracksState>,
    pub repair_cooldown: f64,
    pub upgrade_cooldown: f64,
}

impl Building {
    pub fn new(id: EntityId, owner: SlotId, kind: BuildingKind, position: Position) -> Self {
        let p = kind.profile();
        let armament = (p.attack > 0.0).then(|| Armament {
            attack: p.attack,
            range: p.range,
            last_attack_time: None,
        });
        Building {
            id,
            owner,
            kind,
            position,
            level: 1,
            health: p.health,
            max_health: p.health,
            armament,
            barracks: None,
            repair_cooldown: 0.0,
            upgrade_cooldown: 0.0,
        }
    }

    pub fn barracks(id: EntityId, owner: SlotId, position: Position, lane: Lane) -> Self {
        let mut b = Building::new(id, owner, BuildingKind::Barracks, position);
        b.barracks = Some(BarracksState {
            lane,
            spawn_timer: spawn_cooldown(1),
            available_units: MAX_AVAILABLE_UNITS,
            restore_timer: PURCHASE_RESTORE_INTERVAL,
            last_purchase_time: None,
        });
        b
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_damaged(&self) -> bool {
        self.is_alive() && self.health < self.max_health
    }

    /// Re-derives max health and attack from base, building level and the
    /// owner's building upgrades. Living buildings keep any gained headroom.
    pub fn rederive(&mut self, upgrades: &Upgrades) {
        let p = self.kind.profile();
        let above = self.level.saturating_sub(1) as f64;
        let max_health = p.health * (1.0 + BUILDING_LEVEL_HEALTH_RATIO * above)
            + p.health_per_upgrade * upgrades.building_health as f64;
        if self.is_alive() && max_health > self.max_health {
            self.health += max_health - self.max_health;
        }
        self.max_health = max_health;
        self.health = self.health.min(self.max_health);

        if let Some(arm) = self.armament.as_mut() {
            arm.attack = p.attack
                + BUILDING_LEVEL_ATTACK * above
                + BUILDING_ATTACK_PER_UPGRADE * upgrades.building_attack as f64;
        }
    }
}

/// Auto-spawn period for a barracks of the given level.
pub fn spawn_cooldown(level: u32) -> f64 {
    let scaled = BASE_SPAWN_COOLDOWN * (1.0 - SPAWN_COOLDOWN_STEP * level.saturating_sub(1) as f64);
    scaled.max(BASE_SPAWN_COOLDOWN * MIN_SPAWN_COOLDOWN_RATIO)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    Attack,
    Defense,
    Health,
    GoldIncome,
    BuildingHealth,
    BuildingAttack,
}

impl StatKind {
    /// Everything except raw attack is capped at level 2 until the castle is.
    pub fn is_castle_gated(self) -> bool {
        !matches!(self, StatKind::Attack)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upgrades {
    pub attack: u32,
    pub defense: u32,
    pub health: u32,
    pub gold_income: u32,
    pub building_health: u32,
    pub building_attack: u32,
}

impl Upgrades {
    pub fn level(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::Health => self.health,
            StatKind::GoldIncome => self.gold_income,
            StatKind::BuildingHealth => self.building_health,
            StatKind::BuildingAttack => self.building_attack,
        }
    }

    pub fn level_mut(&mut self, stat: StatKind) -> &mut u32 {
        match stat {
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::Health => &mut self.health,
            StatKind::GoldIncome => &mut self.gold_income,
            StatKind::BuildingHealth => &mut self.building_health,
            StatKind::BuildingAttack => &mut self.building_attack,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotStats {
    pub kills: u32,
    pub losses: u32,
    pub buildings_destroyed: u32,
    pub buildings_lost: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub gold_earned: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub id: SlotId,
    pub gold: u32,
    pub gold_income: u32,
    pub castle: Building,
    pub barracks: Vec<Building>,
    pub towers: Vec<Building>,
    pub units: Vec<Unit>,
    pub upgrades: Upgrades,
    pub is_active: bool,
    pub is_bot: bool,
    pub auto_progression: bool,
    pub stats: SlotStats,
}

impl PlayerSlot {
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        std::iter::once(&self.castle)
            .chain(self.barracks.iter())
            .chain(self.towers.iter())
    }

    pub fn buildings_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        std::iter::once(&mut self.castle)
            .chain(self.barracks.iter_mut())
            .chain(self.towers.iter_mut())
    }

    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings().find(|b| b.id == id)
    }

    pub fn building_mut(&mut self, id: EntityId) -> Option<&mut Building> {
        self.buildings_mut().find(|b| b.id == id)
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }

    pub fn has_living_entity(&self) -> bool {
        self.buildings().any(Building::is_alive) || self.units.iter().any(Unit::is_alive)
    }

    pub fn castle_level(&self) -> u32 {
        self.castle.level
    }

    /// Re-derives every building and unit from bases plus current levels.
    pub fn rederive_all(&mut self) {
        let upgrades = self.upgrades.clone();
        self.gold_income = BASE_GOLD_INCOME + GOLD_INCOME_PER_LEVEL * upgrades.gold_income;
        for b in self.buildings_mut() {
            b.rederive(&upgrades);
        }
        for u in self.units.iter_mut() {
            u.rederive(&upgrades);
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub slots: Vec<PlayerSlot>,
    pub match_time: f64,
    pub is_paused: bool,
    pub speed: f64,
    /// UI-only selection, carried for clients.
    pub selected_slot: Option<SlotId>,
    pub selected_building: Option<EntityId>,
    pub is_game_over: bool,
    pub winner: Option<SlotId>,
    /// Legacy global switch: when set every slot auto-progresses.
    pub auto_progression: bool,
    pub next_entity_id: EntityId,
}

impl MatchState {
    /// Fresh four-slot world; `bot_slots` are flagged bot-controlled.
    pub fn new(bot_slots: &[SlotId]) -> Self {
        let mut state = MatchState {
            slots: Vec::with_capacity(SLOT_COUNT),
            match_time: 0.0,
            is_paused: false,
            speed: 1.0,
            selected_slot: None,
            selected_building: None,
            is_game_over: false,
            winner: None,
            auto_progression: false,
            next_entity_id: 1,
        };
        for id in 0..SLOT_COUNT as SlotId {
            let slot = layout::build_slot(&mut state, id, bot_slots.contains(&id));
            state.slots.push(slot);
        }
        state
    }

    pub fn alloc_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    pub fn slot(&self, id: SlotId) -> Option<&PlayerSlot> {
        self.slots.get(id as usize)
    }

    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut PlayerSlot> {
        self.slots.get_mut(id as usize)
    }

    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.slots.iter().find_map(|s| s.building(id))
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.slots
            .iter()
            .flat_map(|s| s.units.iter())
            .find(|u| u.id == id)
    }

    pub fn auto_progression_enabled(&self, slot: SlotId) -> bool {
        self.auto_progression
            || self
                .slot(slot)
                .is_some_and(|s| s.is_bot || s.auto_progression)
    }

    pub fn active_slots(&self) -> Vec<SlotId> {
        self.slots.iter().filter(|s| s.is_active).map(|s| s.id).collect()
    }

    pub fn bot_slots(&self) -> Vec<SlotId> {
        self.slots.iter().filter(|s| s.is_bot).map(|s| s.id).collect()
    }
}

/// Player command as sent over the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub id: Uuid,
    pub slot: SlotId,
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: IntentKind,
}

impl Intent {
    pub fn new(slot: SlotId, kind: IntentKind) -> Self {
        Intent {
            id: Uuid::new_v4(),
            slot,
            timestamp: Utc::now().timestamp_millis(),
            kind,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum IntentKind {
    BuyUnit {
        barracks_id: EntityId,
        unit_class: UnitClass,
    },
    UpgradeBuilding {
        building_id: EntityId,
    },
    RepairBuilding {
        building_id: EntityId,
    },
    UpgradeStat {
        stat: StatKind,
    },
    TogglePause,
    SetSpeed {
        speed: f64,
    },
    ToggleAutoProgression {
        #[serde(default)]
        global: bool,
    },
}
