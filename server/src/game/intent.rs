//! Validation and application of player intents.
//!
//! `check` never mutates; `apply` runs `check` first and only then touches
//! the state, so a rejected intent leaves the match exactly as it was. Bots
//! and the auto-progression advisor go through the same entry points.

use thiserror::Error;

use crate::game::{
    constants::*,
    layout,
    types::{
        Building, BuildingKind, EntityId, Intent, IntentKind, MatchState, PlayerSlot, SlotId,
        StatKind, Unit, UnitClass,
    },
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("match is over")]
    GameOver,
    #[error("intent declares slot {declared} but was issued by slot {issuer}")]
    SlotMismatch { declared: SlotId, issuer: SlotId },
    #[error("slot {0} is not active")]
    InactiveSlot(SlotId),
    #[error("building {0} does not belong to the issuing slot")]
    UnknownBuilding(EntityId),
    #[error("building {0} is not a barracks")]
    NotBarracks(EntityId),
    #[error("building {0} is destroyed")]
    BuildingDestroyed(EntityId),
    #[error("needs {needed} gold, has {available}")]
    InsufficientGold { needed: u32, available: u32 },
    #[error("no purchase slots left")]
    NoPurchaseSlots,
    #[error("purchase cooldown active")]
    PurchaseCooldown,
    #[error("no enemy unit in the barracks cell")]
    NoEnemyInCell,
    #[error("an allied melee unit already holds the barracks cell")]
    CellAlreadyDefended,
    #[error("upgrade cooldown active")]
    UpgradeCooldown,
    #[error("already at max level")]
    MaxLevel,
    #[error("requires a level-2 castle")]
    CastleLevelTooLow,
    #[error("building already at full health")]
    AlreadyFullHealth,
    #[error("repair cooldown active")]
    RepairCooldown,
    #[error("speed {0} out of range")]
    InvalidSpeed(f64),
}

pub fn stat_upgrade_cost(level: u32) -> u32 {
    (level + 1) * STAT_UPGRADE_COST_STEP
}

pub fn building_upgrade_cost(level: u32) -> u32 {
    level * BUILDING_UPGRADE_COST_STEP
}

pub fn repair_cost(level: u32) -> u32 {
    level * REPAIR_COST_PER_LEVEL
}

fn afford(slot: &PlayerSlot, needed: u32) -> Result<(), Rejection> {
    if slot.gold < needed {
        return Err(Rejection::InsufficientGold {
            needed,
            available: slot.gold,
        });
    }
    Ok(())
}

fn own_building(slot: &PlayerSlot, id: EntityId) -> Result<&Building, Rejection> {
    let b = slot.building(id).ok_or(Rejection::UnknownBuilding(id))?;
    if !b.is_alive() {
        return Err(Rejection::BuildingDestroyed(id));
    }
    Ok(b)
}

fn check_buy(
    state: &MatchState,
    slot: &PlayerSlot,
    barracks_id: EntityId,
    class: UnitClass,
) -> Result<(), Rejection> {
    let b = own_building(slot, barracks_id)?;
    let bk = b.barracks.as_ref().ok_or(Rejection::NotBarracks(barracks_id))?;
    afford(slot, class.cost())?;
    if bk.available_units == 0 {
        return Err(Rejection::NoPurchaseSlots);
    }
    if bk
        .last_purchase_time
        .is_some_and(|t| state.match_time - t < PURCHASE_COOLDOWN)
    {
        return Err(Rejection::PurchaseCooldown);
    }

    let cell = b.position.cell();
    let in_cell = |u: &&Unit| u.is_alive() && u.position.cell() == cell;
    let enemy_present = state
        .slots
        .iter()
        .filter(|s| s.id != slot.id)
        .flat_map(|s| s.units.iter())
        .any(|u| in_cell(&u));
    if !enemy_present {
        return Err(Rejection::NoEnemyInCell);
    }
    if slot
        .units
        .iter()
        .filter(in_cell)
        .any(|u| u.class == UnitClass::Melee)
    {
        return Err(Rejection::CellAlreadyDefended);
    }
    Ok(())
}

fn check_building_upgrade(slot: &PlayerSlot, building_id: EntityId) -> Result<(), Rejection> {
    let b = own_building(slot, building_id)?;
    if b.upgrade_cooldown > 0.0 {
        return Err(Rejection::UpgradeCooldown);
    }
    if b.level >= MAX_BUILDING_LEVEL {
        return Err(Rejection::MaxLevel);
    }
    if b.kind == BuildingKind::Barracks
        && b.level + 1 > CASTLE_GATED_LEVEL
        && slot.castle_level() < CASTLE_GATED_LEVEL
    {
        return Err(Rejection::CastleLevelTooLow);
    }
    afford(slot, building_upgrade_cost(b.level))
}

fn check_repair(slot: &PlayerSlot, building_id: EntityId) -> Result<(), Rejection> {
    let b = own_building(slot, building_id)?;
    if b.health >= b.max_health {
        return Err(Rejection::AlreadyFullHealth);
    }
    if b.repair_cooldown > 0.0 {
        return Err(Rejection::RepairCooldown);
    }
    afford(slot, repair_cost(b.level))
}

fn check_stat_upgrade(slot: &PlayerSlot, stat: StatKind) -> Result<(), Rejection> {
    let level = slot.upgrades.level(stat);
    if level >= MAX_STAT_LEVEL {
        return Err(Rejection::MaxLevel);
    }
    if stat.is_castle_gated()
        && level + 1 > CASTLE_GATED_LEVEL
        && slot.castle_level() < CASTLE_GATED_LEVEL
    {
        return Err(Rejection::CastleLevelTooLow);
    }
    afford(slot, stat_upgrade_cost(level))
}

/// Validates `intent` as issued by `issuer` without touching the state.
pub fn check(state: &MatchState, intent: &Intent, issuer: SlotId) -> Result<(), Rejection> {
    if state.is_game_over {
        return Err(Rejection::GameOver);
    }
    if intent.slot != issuer {
        return Err(Rejection::SlotMismatch {
            declared: intent.slot,
            issuer,
        });
    }
    let slot = state
        .slot(issuer)
        .filter(|s| s.is_active)
        .ok_or(Rejection::InactiveSlot(issuer))?;

    match &intent.kind {
        IntentKind::BuyUnit {
            barracks_id,
            unit_class,
        } => check_buy(state, slot, *barracks_id, *unit_class),
        IntentKind::UpgradeBuilding { building_id } => check_building_upgrade(slot, *building_id),
        IntentKind::RepairBuilding { building_id } => check_repair(slot, *building_id),
        IntentKind::UpgradeStat { stat } => check_stat_upgrade(slot, *stat),
        IntentKind::SetSpeed { speed } if !(MIN_SPEED..=MAX_SPEED).contains(speed) => {
            Err(Rejection::InvalidSpeed(*speed))
        }
        IntentKind::SetSpeed { .. }
        | IntentKind::TogglePause
        | IntentKind::ToggleAutoProgression { .. } => Ok(()),
    }
}

/// Validates and, on success, applies `intent` for `issuer`.
pub fn apply(state: &mut MatchState, intent: &Intent, issuer: SlotId) -> Result<(), Rejection> {
    check(state, intent, issuer)?;
    let now = state.match_time;

    match &intent.kind {
        IntentKind::BuyUnit {
            barracks_id,
            unit_class,
        } => {
            let id = state.alloc_id();
            let Some(slot) = state.slot_mut(issuer) else {
                return Err(Rejection::InactiveSlot(issuer));
            };
            let upgrades = slot.upgrades.clone();
            let Some(b) = slot.building_mut(*barracks_id) else {
                return Err(Rejection::UnknownBuilding(*barracks_id));
            };
            let position = b.position;
            let Some(bk) = b.barracks.as_mut() else {
                return Err(Rejection::NotBarracks(*barracks_id));
            };
            bk.available_units -= 1;
            bk.last_purchase_time = Some(now);
            let lane = bk.lane;

            slot.gold -= unit_class.cost();
            slot.units.push(Unit::spawn(
                id,
                issuer,
                *unit_class,
                position,
                layout::lane_route(issuer, lane),
                &upgrades,
            ));
        }
        IntentKind::UpgradeBuilding { building_id } => {
            let Some(slot) = state.slot_mut(issuer) else {
                return Err(Rejection::InactiveSlot(issuer));
            };
            let Some(b) = slot.building_mut(*building_id) else {
                return Err(Rejection::UnknownBuilding(*building_id));
            };
            let cost = building_upgrade_cost(b.level);
            b.level += 1;
            b.upgrade_cooldown = UPGRADE_COOLDOWN;
            slot.gold -= cost;
            slot.rederive_all();
        }
        IntentKind::RepairBuilding { building_id } => {
            let Some(slot) = state.slot_mut(issuer) else {
                return Err(Rejection::InactiveSlot(issuer));
            };
            let Some(b) = slot.building_mut(*building_id) else {
                return Err(Rejection::UnknownBuilding(*building_id));
            };
            let cost = repair_cost(b.level);
            b.health = (b.health + b.max_health * REPAIR_FRACTION).min(b.max_health);
            b.repair_cooldown = REPAIR_COOLDOWN;
            slot.gold -= cost;
        }
        IntentKind::UpgradeStat { stat } => {
            let Some(slot) = state.slot_mut(issuer) else {
                return Err(Rejection::InactiveSlot(issuer));
            };
            let level = slot.upgrades.level_mut(*stat);
            let cost = stat_upgrade_cost(*level);
            *level += 1;
            slot.gold -= cost;
            slot.rederive_all();
        }
        IntentKind::TogglePause => state.is_paused = !state.is_paused,
        IntentKind::SetSpeed { speed } => state.speed = *speed,
        IntentKind::ToggleAutoProgression { global: true } => {
            state.auto_progression = !state.auto_progression;
        }
        IntentKind::ToggleAutoProgression { global: false } => {
            if let Some(slot) = state.slot_mut(issuer) {
                slot.auto_progression = !slot.auto_progression;
            }
        }
    }
    Ok(())
}
