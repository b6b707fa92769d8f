//! One async task per live match: the single writer of its `MatchState`.
//!
//! Ticks, intents, reconnections and snapshot requests are all serialized
//! through one `select!` loop, so the simulation never sees concurrent
//! mutation.

use std::collections::HashSet;

use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{interval, Duration, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    config::settings,
    game::{
        orchestrator::Orchestrator,
        types::{Intent, MatchState, SlotId},
    },
    lobby::session::SessionId,
    metrics::{INTENTS_REJECTED, TICKS},
    protocol::{PlayerSlotMap, ServerMsg},
    session::registry::RegistryError,
    ws::hub::Hub,
};

#[derive(Debug)]
pub enum MatchCommand {
    /// A member finished loading; starts ticking and the snapshot cadence.
    Init { session: SessionId },
    Intent {
        session: SessionId,
        intent: Intent,
        reply: Option<oneshot::Sender<Result<(), RegistryError>>>,
    },
    Snapshot { session: SessionId },
    Reconnect {
        session: SessionId,
        previous: SessionId,
        slot: SlotId,
        reply: oneshot::Sender<Result<(), RegistryError>>,
    },
    Disconnect { session: SessionId },
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct MatchActor {
    room_id: Uuid,
    orchestrator: Orchestrator,
    slot_map: PlayerSlotMap,
    connected: HashSet<SessionId>,
    initialized: bool,
    finished: bool,
    hub: Hub,
    snapshots: watch::Sender<MatchState>,
}

impl MatchActor {
    pub fn new(
        room_id: Uuid,
        orchestrator: Orchestrator,
        slot_map: PlayerSlotMap,
        hub: Hub,
        snapshots: watch::Sender<MatchState>,
    ) -> Self {
        // Every human is connected at hand-off time.
        let connected = slot_map.keys().copied().collect();
        Self {
            room_id,
            orchestrator,
            slot_map,
            connected,
            initialized: false,
            finished: false,
            hub,
            snapshots,
        }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<MatchCommand>) {
        let tick_ms = settings().tick_ms;
        let broadcast_every = Duration::from_millis(settings().broadcast_ms);
        let mut ticker = interval(Duration::from_millis(tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut since_broadcast = Duration::ZERO;

        loop {
            tokio::select! {
                _ = ticker.tick(), if self.initialized && !self.finished => {
                    self.tick();
                    since_broadcast += Duration::from_millis(tick_ms);
                    if self.finished {
                        log::info!(
                            "match {} over, winner {:?}",
                            self.room_id,
                            self.orchestrator.state().winner
                        );
                        self.broadcast_snapshot();
                    } else if since_broadcast >= broadcast_every {
                        since_broadcast = Duration::ZERO;
                        self.broadcast_snapshot();
                    }
                }

                cmd = rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle(cmd) == Flow::Exit {
                        break;
                    }
                }
            }
        }
        log::info!("match {} task stopped", self.room_id);
    }

    fn tick(&mut self) {
        let outcome = self.orchestrator.step();
        if !outcome.advanced {
            return;
        }
        TICKS.inc();
        if !outcome.combat.units_killed.is_empty() || !outcome.combat.buildings_destroyed.is_empty()
        {
            log::trace!(
                "match {}: {} units, {} buildings destroyed",
                self.room_id,
                outcome.combat.units_killed.len(),
                outcome.combat.buildings_destroyed.len()
            );
        }
        for intent in outcome.automated {
            let relay = ServerMsg::GameAction {
                room_id: self.room_id,
                action: intent,
            };
            self.hub.broadcast(self.connected.iter(), &relay);
        }
        self.finished = outcome.finished;
    }

    fn handle(&mut self, cmd: MatchCommand) -> Flow {
        match cmd {
            MatchCommand::Init { session } => {
                if !self.slot_map.contains_key(&session) {
                    self.hub.send(
                        session,
                        &ServerMsg::GameError {
                            message: RegistryError::NotAPlayer.to_string(),
                        },
                    );
                    return Flow::Continue;
                }
                self.connected.insert(session);
                self.initialized = true;
                self.hub
                    .broadcast(self.connected.iter(), &self.full_snapshot());
            }

            MatchCommand::Intent {
                session,
                intent,
                reply,
            } => {
                let result = self.apply_intent(session, &intent);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }

            MatchCommand::Snapshot { session } => self.send_snapshot(session),

            MatchCommand::Reconnect {
                session,
                previous,
                slot,
                reply,
            } => {
                let result = self.remap(session, previous, slot);
                if result.is_ok() {
                    self.hub.send(
                        session,
                        &ServerMsg::GameReconnected {
                            room_id: self.room_id,
                            player_slot: slot,
                        },
                    );
                    self.send_snapshot(session);
                }
                let _ = reply.send(result);
            }

            MatchCommand::Disconnect { session } => {
                if self.connected.remove(&session) && self.connected.is_empty() {
                    log::info!("match {}: last player left", self.room_id);
                    return Flow::Exit;
                }
            }
        }
        Flow::Continue
    }

    fn apply_intent(&mut self, session: SessionId, intent: &Intent) -> Result<(), RegistryError> {
        let slot = *self
            .slot_map
            .get(&session)
            .ok_or(RegistryError::NotAPlayer)?;

        if let Err(rejection) = self.orchestrator.apply_intent(intent, slot) {
            INTENTS_REJECTED.inc();
            log::debug!(
                "match {}: intent {} from slot {slot} rejected: {rejection}",
                self.room_id,
                intent.id
            );
            return Err(rejection.into());
        }

        self.publish();
        let state = ServerMsg::GameState {
            game_state: self.orchestrator.state().clone(),
            ai_slots: None,
            player_slot_map: None,
        };
        self.hub.broadcast(self.connected.iter(), &state);
        let relay = ServerMsg::GameAction {
            room_id: self.room_id,
            action: intent.clone(),
        };
        self.hub
            .broadcast(self.connected.iter().filter(|s| **s != session), &relay);
        Ok(())
    }

    /// Moves the slot held by `previous` over to `session`.
    fn remap(
        &mut self,
        session: SessionId,
        previous: SessionId,
        slot: SlotId,
    ) -> Result<(), RegistryError> {
        if self.slot_map.get(&previous) != Some(&slot) {
            return Err(RegistryError::BadReconnect);
        }
        self.slot_map.remove(&previous);
        self.slot_map.insert(session, slot);
        self.connected.remove(&previous);
        self.connected.insert(session);
        log::info!(
            "match {}: slot {slot} reconnected ({previous} -> {session})",
            self.room_id
        );
        Ok(())
    }

    fn full_snapshot(&self) -> ServerMsg {
        ServerMsg::GameState {
            game_state: self.orchestrator.state().clone(),
            ai_slots: Some(self.orchestrator.state().bot_slots()),
            player_slot_map: Some(self.slot_map.clone()),
        }
    }

    fn send_snapshot(&self, session: SessionId) {
        self.hub.send(session, &self.full_snapshot());
    }

    fn broadcast_snapshot(&self) {
        self.publish();
        self.hub
            .broadcast(self.connected.iter(), &self.full_snapshot());
    }

    fn publish(&self) {
        self.snapshots
            .send_replace(self.orchestrator.state().clone());
    }
}

