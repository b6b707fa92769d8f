//! Balance tables and fixed simulation parameters.

use crate::game::types::{BuildingKind, UnitClass};

pub const SLOT_COUNT: usize = 4;

// ---------- map ----------
pub const MAP_SIZE: f64 = 800.0;
pub const GRID_CELL_SIZE: f64 = 100.0;

// ---------- movement ----------
pub const ARRIVAL_RADIUS: f64 = 20.0;
pub const MIN_UNIT_SPACING: f64 = 16.0;
pub const MAX_SEPARATION_PUSH: f64 = 4.0;

// ---------- combat ----------
pub const DETECTION_RADIUS: f64 = 150.0;
pub const RANGED_THRESHOLD: f64 = 80.0;
pub const MELEE_DISTANCE: f64 = 35.0;
pub const SIEGE_DISTANCE: f64 = 60.0;
pub const UNIT_ATTACK_COOLDOWN: f64 = 1.5;
pub const BUILDING_ATTACK_COOLDOWN: f64 = 1.0;

// ---------- economy ----------
pub const STARTING_GOLD: u32 = 300;
pub const BASE_GOLD_INCOME: u32 = 10;
pub const GOLD_INCOME_PER_LEVEL: u32 = 5;
pub const GOLD_INTERVAL: f64 = 1.0;

pub const BASE_SPAWN_COOLDOWN: f64 = 15.0;
pub const SPAWN_COOLDOWN_STEP: f64 = 0.10;
pub const MIN_SPAWN_COOLDOWN_RATIO: f64 = 0.5;

pub const MAX_AVAILABLE_UNITS: u32 = 5;
pub const PURCHASE_RESTORE_INTERVAL: f64 = 10.0;
pub const PURCHASE_COOLDOWN: f64 = 5.0;

// ---------- upgrades ----------
pub const STAT_UPGRADE_COST_STEP: u32 = 150;
pub const BUILDING_UPGRADE_COST_STEP: u32 = 200;
pub const UPGRADE_COOLDOWN: f64 = 20.0;
pub const MAX_BUILDING_LEVEL: u32 = 3;
pub const MAX_STAT_LEVEL: u32 = 5;
/// Levels above this require a level-2 castle.
pub const CASTLE_GATED_LEVEL: u32 = 2;

pub const REPAIR_COST_PER_LEVEL: u32 = 100;
pub const REPAIR_COOLDOWN: f64 = 300.0;
pub const REPAIR_FRACTION: f64 = 0.30;

pub const ATTACK_PER_LEVEL: f64 = 3.0;
pub const DEFENSE_MULTIPLIER_PER_LEVEL: f64 = 0.25;
pub const HEALTH_MULTIPLIER_PER_LEVEL: f64 = 0.15;

pub const BUILDING_LEVEL_HEALTH_RATIO: f64 = 0.25;
pub const BUILDING_LEVEL_ATTACK: f64 = 4.0;
pub const BUILDING_ATTACK_PER_UPGRADE: f64 = 5.0;

// ---------- orchestration cadences (game seconds) ----------
pub const TICK_SECONDS: f64 = 0.05;
pub const ADVISOR_INTERVAL: f64 = 2.0;
pub const BOT_INTERVAL: f64 = 3.0;

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 4.0;

/// Base combat profile of a unit class.
#[derive(Debug, Clone, Copy)]
pub struct UnitProfile {
    pub health: f64,
    pub attack: f64,
    pub defense: f64,
    pub speed: f64,
    pub range: f64,
    pub cost: u32,
    pub bounty: u32,
}

impl UnitClass {
    pub fn profile(self) -> UnitProfile {
        match self {
            UnitClass::Melee => UnitProfile {
                health: 120.0,
                attack: 18.0,
                defense: 6.0,
                speed: 40.0,
                range: 30.0,
                cost: 50,
                bounty: 10,
            },
            UnitClass::FastRanged => UnitProfile {
                health: 70.0,
                attack: 14.0,
                defense: 3.0,
                speed: 60.0,
                range: 110.0,
                cost: 75,
                bounty: 15,
            },
            UnitClass::SlowRanged => UnitProfile {
                health: 90.0,
                attack: 28.0,
                defense: 2.0,
                speed: 30.0,
                range: 180.0,
                cost: 100,
                bounty: 20,
            },
        }
    }

    pub fn cost(self) -> u32 {
        self.profile().cost
    }
}

/// Base profile of a building kind (attack 0 ⇒ unarmed).
#[derive(Debug, Clone, Copy)]
pub struct BuildingProfile {
    pub health: f64,
    pub attack: f64,
    pub range: f64,
    /// Max-health bonus per building-health upgrade level.
    pub health_per_upgrade: f64,
    pub bounty: u32,
    /// Target preference when a unit falls back onto buildings.
    pub target_weight: f64,
}

impl BuildingKind {
    pub fn profile(self) -> BuildingProfile {
        match self {
            BuildingKind::Castle => BuildingProfile {
                health: 2000.0,
                attack: 30.0,
                range: 160.0,
                health_per_upgrade: 300.0,
                bounty: 300,
                target_weight: 3.0,
            },
            BuildingKind::Barracks => BuildingProfile {
                health: 800.0,
                attack: 0.0,
                range: 0.0,
                health_per_upgrade: 120.0,
                bounty: 100,
                target_weight: 2.0,
            },
            BuildingKind::Tower => BuildingProfile {
                health: 600.0,
                attack: 22.0,
                range: 140.0,
                health_per_upgrade: 100.0,
                bounty: 75,
                target_weight: 1.0,
            },
        }
    }
}
