//! Auto-progression: picks one stat upgrade per cycle from a posture-based
//! priority list.

use crate::game::{
    intent,
    types::{Intent, IntentKind, MatchState, SlotId, StatKind},
};

/// Castle health ratio under which a slot turtles up.
const CRITICAL_CASTLE_RATIO: f64 = 0.4;
/// Gold reserve under which a slot keeps investing in income.
const ECONOMIC_RESERVE: u32 = 200;
/// Income level a slot tries to reach before anything else.
const TARGET_INCOME_LEVEL: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    Economic,
    Offensive,
    Defensive,
}

impl Posture {
    pub fn priorities(self) -> &'static [StatKind] {
        match self {
            Posture::Economic => &[
                StatKind::GoldIncome,
                StatKind::Health,
                StatKind::Defense,
                StatKind::Attack,
            ],
            Posture::Offensive => &[
                StatKind::Attack,
                StatKind::Health,
                StatKind::GoldIncome,
                StatKind::BuildingAttack,
            ],
            Posture::Defensive => &[
                StatKind::Defense,
                StatKind::BuildingHealth,
                StatKind::BuildingAttack,
                StatKind::Health,
            ],
        }
    }
}

pub fn classify(state: &MatchState, slot: SlotId) -> Option<Posture> {
    let me = state.slot(slot)?;
    let own_units = me.living_units().count();
    let strongest_enemy = state
        .slots
        .iter()
        .filter(|s| s.id != slot && s.is_active)
        .map(|s| s.living_units().count())
        .max()
        .unwrap_or(0);
    let castle_ratio = if me.castle.max_health > 0.0 {
        me.castle.health / me.castle.max_health
    } else {
        0.0
    };

    let posture = if castle_ratio < CRITICAL_CASTLE_RATIO || own_units < strongest_enemy {
        Posture::Defensive
    } else if me.upgrades.gold_income < TARGET_INCOME_LEVEL || me.gold < ECONOMIC_RESERVE {
        Posture::Economic
    } else {
        Posture::Offensive
    };
    Some(posture)
}

/// Highest-priority stat upgrade the slot can afford right now, if any.
pub fn advise(state: &MatchState, slot: SlotId) -> Option<Intent> {
    let posture = classify(state, slot)?;
    posture
        .priorities()
        .iter()
        .map(|&stat| Intent::new(slot, IntentKind::UpgradeStat { stat }))
        .find(|candidate| intent::check(state, candidate, slot).is_ok())
}
