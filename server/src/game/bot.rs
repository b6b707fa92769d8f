//! Synthetic opponents: one weighted-random intent per decision cycle.

use rand::{seq::IndexedRandom, Rng};

use crate::game::{
    intent,
    types::{Intent, IntentKind, MatchState, SlotId, UnitClass},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    BuyUnit,
    UpgradeBuilding,
    RepairBuilding,
}

const ACTION_WEIGHTS: [(BotAction, u32); 3] = [
    (BotAction::BuyUnit, 40),
    (BotAction::UpgradeBuilding, 30),
    (BotAction::RepairBuilding, 30),
];

fn weighted_pick<R: Rng>(rng: &mut R) -> BotAction {
    let total: u32 = ACTION_WEIGHTS.iter().map(|(_, w)| w).sum();
    let roll = rng.random_range(0..total);
    let mut acc = 0;
    for (action, weight) in ACTION_WEIGHTS {
        acc += weight;
        if roll < acc {
            return action;
        }
    }
    ACTION_WEIGHTS[ACTION_WEIGHTS.len() - 1].0
}

/// Every intent of the given action the slot could issue right now.
pub fn candidates(state: &MatchState, slot: SlotId, action: BotAction) -> Vec<Intent> {
    let Some(me) = state.slot(slot) else {
        return Vec::new();
    };
    let kinds: Vec<IntentKind> = match action {
        BotAction::BuyUnit => me
            .barracks
            .iter()
            .flat_map(|b| {
                UnitClass::ALL.iter().map(|&unit_class| IntentKind::BuyUnit {
                    barracks_id: b.id,
                    unit_class,
                })
            })
            .collect(),
        BotAction::UpgradeBuilding => me
            .buildings()
            .map(|b| IntentKind::UpgradeBuilding { building_id: b.id })
            .collect(),
        BotAction::RepairBuilding => me
            .buildings()
            .filter(|b| b.is_damaged())
            .map(|b| IntentKind::RepairBuilding { building_id: b.id })
            .collect(),
    };
    kinds
        .into_iter()
        .map(|kind| Intent::new(slot, kind))
        .filter(|i| intent::check(state, i, slot).is_ok())
        .collect()
}

/// Picks at most one intent for a bot slot; `None` when the rolled action has
/// no eligible target.
pub fn decide<R: Rng>(state: &MatchState, slot: SlotId, rng: &mut R) -> Option<Intent> {
    let action = weighted_pick(rng);
    candidates(state, slot, action).choose(rng).cloned()
}
