//! Gold income, barracks auto-spawn, cooldown decay and purchase-slot refill.

use crate::game::{
    constants::*,
    layout,
    types::{spawn_cooldown, MatchState, Unit, UnitClass},
};

/// Accumulator for the once-per-second gold cadence. Per-barracks timers live
/// on the barracks themselves.
#[derive(Debug, Default, Clone)]
pub struct EconomyTicker {
    gold_acc: f64,
}

impl EconomyTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pays every active slot its income once per elapsed second.
    pub fn tick_gold(&mut self, state: &mut MatchState, dt: f64) {
        self.gold_acc += dt;
        while self.gold_acc >= GOLD_INTERVAL {
            self.gold_acc -= GOLD_INTERVAL;
            for slot in state.slots.iter_mut().filter(|s| s.is_active) {
                slot.gold += slot.gold_income;
                slot.stats.gold_earned += u64::from(slot.gold_income);
            }
        }
    }
}

/// Class of the `n`-th unit in a barracks wave.
fn wave_class(n: u32) -> UnitClass {
    UnitClass::ALL[n as usize % UnitClass::ALL.len()]
}

/// Counts down every living barracks and releases a wave of `level` units on
/// expiry.
pub fn tick_spawns(state: &mut MatchState, dt: f64) {
    let mut waves = Vec::new();
    for slot in state.slots.iter_mut().filter(|s| s.is_active) {
        for b in slot.barracks.iter_mut().filter(|b| b.is_alive()) {
            let Some(bk) = b.barracks.as_mut() else {
                continue;
            };
            bk.spawn_timer -= dt;
            if bk.spawn_timer <= 0.0 {
                bk.spawn_timer = spawn_cooldown(b.level);
                waves.push((slot.id, bk.lane, b.position, b.level));
            }
        }
    }

    for (owner, lane, position, level) in waves {
        for n in 0..level {
            let id = state.alloc_id();
            let Some(slot) = state.slot_mut(owner) else {
                continue;
            };
            let unit = Unit::spawn(
                id,
                owner,
                wave_class(n),
                position,
                layout::lane_route(owner, lane),
                &slot.upgrades,
            );
            slot.units.push(unit);
        }
    }
}

/// Repair and upgrade cooldowns run down at tick rate.
pub fn tick_cooldowns(state: &mut MatchState, dt: f64) {
    for b in state.slots.iter_mut().flat_map(|s| s.buildings_mut()) {
        b.repair_cooldown = (b.repair_cooldown - dt).max(0.0);
        b.upgrade_cooldown = (b.upgrade_cooldown - dt).max(0.0);
    }
}

/// Refills one buyable unit per barracks every restore interval, up to the cap.
pub fn tick_purchase_slots(state: &mut MatchState, dt: f64) {
    for b in state.slots.iter_mut().flat_map(|s| s.barracks.iter_mut()) {
        let Some(bk) = b.barracks.as_mut() else {
            continue;
        };
        if bk.available_units >= MAX_AVAILABLE_UNITS {
            bk.restore_timer = PURCHASE_RESTORE_INTERVAL;
            continue;
        }
        bk.restore_timer -= dt;
        if bk.restore_timer <= 0.0 {
            bk.available_units += 1;
            bk.restore_timer = PURCHASE_RESTORE_INTERVAL;
        }
    }
}
