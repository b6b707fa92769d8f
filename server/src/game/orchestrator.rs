//! Fixed-period match driver.
//!
//! One `step` is one 50 ms tick. Every cadence (gold, spawns, advisor, bots)
//! is an accumulator inside this driver so nothing else ever mutates the
//! match concurrently.

use rand::{rngs::StdRng, SeedableRng};

use crate::game::{
    advisor, bot,
    combat::{self, CombatReport},
    constants::*,
    economy::{self, EconomyTicker},
    intent::{self, Rejection},
    movement,
    types::{Intent, MatchState, SlotId},
};

/// What a single tick did, for logging and broadcasting.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub advanced: bool,
    pub combat: CombatReport,
    /// Intents issued on behalf of bots and auto-progressing slots.
    pub automated: Vec<Intent>,
    /// Set on the tick that ended the match.
    pub finished: bool,
}

#[derive(Debug)]
pub struct Orchestrator {
    state: MatchState,
    economy: EconomyTicker,
    advisor_acc: f64,
    bot_acc: f64,
    rng: StdRng,
}

impl Orchestrator {
    pub fn new(state: MatchState, seed: u64) -> Self {
        Self {
            state,
            economy: EconomyTicker::new(),
            advisor_acc: 0.0,
            bot_acc: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    /// Player-issued intent, routed through the same handler as bots.
    pub fn apply_intent(&mut self, intent: &Intent, issuer: SlotId) -> Result<(), Rejection> {
        intent::apply(&mut self.state, intent, issuer)
    }

    /// Advances the match by one tick unless paused or already decided.
    pub fn step(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.state.is_paused || self.state.is_game_over {
            return outcome;
        }
        let dt = TICK_SECONDS * self.state.speed;
        outcome.advanced = true;

        self.economy.tick_gold(&mut self.state, dt);
        economy::tick_spawns(&mut self.state, dt);
        movement::advance(&mut self.state, dt);
        movement::separate(&mut self.state);
        outcome.combat = combat::resolve(&mut self.state);
        combat::sweep_dead(&mut self.state);
        economy::tick_cooldowns(&mut self.state, dt);
        economy::tick_purchase_slots(&mut self.state, dt);

        self.advisor_acc += dt;
        if self.advisor_acc >= ADVISOR_INTERVAL {
            self.advisor_acc -= ADVISOR_INTERVAL;
            self.run_advisor(&mut outcome.automated);
        }
        self.bot_acc += dt;
        if self.bot_acc >= BOT_INTERVAL {
            self.bot_acc -= BOT_INTERVAL;
            self.run_bots(&mut outcome.automated);
        }

        self.state.match_time += dt;
        refresh_activity(&mut self.state);
        outcome.finished = evaluate_winner(&mut self.state);
        outcome
    }

    fn run_advisor(&mut self, applied: &mut Vec<Intent>) {
        let slots: Vec<SlotId> = self
            .state
            .active_slots()
            .into_iter()
            .filter(|s| self.state.auto_progression_enabled(*s))
            .collect();
        for slot in slots {
            if let Some(intent) = advisor::advise(&self.state, slot) {
                self.dispatch(intent, slot, applied);
            }
        }
    }

    fn run_bots(&mut self, applied: &mut Vec<Intent>) {
        let bots: Vec<SlotId> = self
            .state
            .slots
            .iter()
            .filter(|s| s.is_bot && s.is_active)
            .map(|s| s.id)
            .collect();
        for slot in bots {
            if let Some(intent) = bot::decide(&self.state, slot, &mut self.rng) {
                self.dispatch(intent, slot, applied);
            }
        }
    }

    fn dispatch(&mut self, intent: Intent, slot: SlotId, applied: &mut Vec<Intent>) {
        match intent::apply(&mut self.state, &intent, slot) {
            Ok(()) => applied.push(intent),
            Err(e) => log::debug!("automated intent for slot {slot} rejected: {e}"),
        }
    }
}

/// A slot stays active while it owns any living building or unit.
pub fn refresh_activity(state: &mut MatchState) {
    for slot in state.slots.iter_mut() {
        slot.is_active = slot.has_living_entity();
    }
}

/// Ends the match when at most one slot is left; returns `true` on the tick
/// that decided it.
pub fn evaluate_winner(state: &mut MatchState) -> bool {
    if state.is_game_over {
        return false;
    }
    let active = state.active_slots();
    match active.as_slice() {
        [winner] => {
            state.winner = Some(*winner);
        }
        [] => {
            state.winner = None;
        }
        _ => return false,
    }
    state.is_game_over = true;
    state.is_paused = true;
    true
}
