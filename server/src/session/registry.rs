//! Live matches by room id. The registry owns every match task's handle and
//! is the only way to reach a running match.

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use rand::Rng;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    config::settings,
    game::{
        constants::SLOT_COUNT,
        intent::Rejection,
        orchestrator::Orchestrator,
        types::{Intent, MatchState, SlotId},
    },
    lobby::session::SessionId,
    metrics::ACTIVE_MATCHES,
    protocol::PlayerSlotMap,
    session::actor::{MatchActor, MatchCommand},
    ws::hub::Hub,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("room {0} not found")]
    RoomNotFound(Uuid),
    #[error("room {0} already exists")]
    RoomExists(Uuid),
    #[error("slot map must assign distinct slots below {SLOT_COUNT}")]
    InvalidSlotMap,
    #[error("session is not a player in this match")]
    NotAPlayer,
    #[error("previous session and slot do not match")]
    BadReconnect,
    #[error("match task has stopped")]
    Closed,
    #[error("intent rejected: {0}")]
    Rejected(#[from] Rejection),
}

/// Cloneable front door to one running match.
#[derive(Clone, Debug)]
pub struct MatchHandle {
    pub room_id: Uuid,
    commands: mpsc::Sender<MatchCommand>,
    snapshots: watch::Receiver<MatchState>,
}

impl MatchHandle {
    /// Read-only view of the latest published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MatchState> {
        self.snapshots.clone()
    }

    pub async fn send(&self, cmd: MatchCommand) -> Result<(), RegistryError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| RegistryError::Closed)
    }

    /// Applies an intent through the match's single writer.
    pub async fn issue_intent(
        &self,
        session: SessionId,
        intent: Intent,
    ) -> Result<(), RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.send(MatchCommand::Intent {
            session,
            intent,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| RegistryError::Closed)?
    }
}

struct MatchEntry {
    handle: MatchHandle,
    task: JoinHandle<()>,
}

#[derive(Clone)]
pub struct SessionRegistry {
    matches: Arc<DashMap<Uuid, MatchEntry>>,
    /// Which room each human session plays in.
    rooms_by_session: Arc<DashMap<SessionId, Uuid>>,
    hub: Hub,
}

impl SessionRegistry {
    pub fn new(hub: Hub) -> Self {
        Self {
            matches: Arc::new(DashMap::new()),
            rooms_by_session: Arc::new(DashMap::new()),
            hub,
        }
    }

    /// Builds a fresh match and spawns its task. Slots missing from
    /// `player_slots` are bot-controlled.
    pub fn create(
        &self,
        room_id: Uuid,
        player_slots: PlayerSlotMap,
    ) -> Result<MatchHandle, RegistryError> {
        validate_slot_map(&player_slots)?;
        if self.matches.contains_key(&room_id) {
            return Err(RegistryError::RoomExists(room_id));
        }

        let bot_slots: Vec<SlotId> = (0..SLOT_COUNT as SlotId)
            .filter(|s| !player_slots.values().any(|p| p == s))
            .collect();
        let state = MatchState::new(&bot_slots);
        let seed = settings()
            .match_seed
            .unwrap_or_else(|| rand::rng().random());

        let (tx, rx) = mpsc::channel::<MatchCommand>(64);
        let (snap_tx, snap_rx) = watch::channel(state.clone());
        let handle = MatchHandle {
            room_id,
            commands: tx,
            snapshots: snap_rx,
        };

        for session in player_slots.keys() {
            self.rooms_by_session.insert(*session, room_id);
        }
        let actor = MatchActor::new(
            room_id,
            Orchestrator::new(state, seed),
            player_slots,
            self.hub.clone(),
            snap_tx,
        );
        let registry = self.clone();
        let task = tokio::spawn(async move {
            actor.run(rx).await;
            registry.release(room_id);
        });

        self.matches.insert(
            room_id,
            MatchEntry {
                handle: handle.clone(),
                task,
            },
        );
        ACTIVE_MATCHES.inc();
        log::info!("match {room_id} created (bots {bot_slots:?}, seed {seed})");
        Ok(handle)
    }

    pub fn get(&self, room_id: Uuid) -> Option<MatchHandle> {
        self.matches.get(&room_id).map(|e| e.handle.clone())
    }

    /// Routes one command to the match task.
    pub async fn update(&self, room_id: Uuid, cmd: MatchCommand) -> Result<(), RegistryError> {
        let handle = self
            .get(room_id)
            .ok_or(RegistryError::RoomNotFound(room_id))?;
        handle.send(cmd).await
    }

    /// Stops the match task and forgets the room.
    pub fn delete(&self, room_id: Uuid) -> bool {
        match self.release(room_id) {
            Some(entry) => {
                entry.task.abort();
                true
            }
            None => false,
        }
    }

    pub async fn issue_intent(
        &self,
        room_id: Uuid,
        session: SessionId,
        intent: Intent,
    ) -> Result<(), RegistryError> {
        let handle = self
            .get(room_id)
            .ok_or(RegistryError::RoomNotFound(room_id))?;
        handle.issue_intent(session, intent).await
    }

    /// Remaps `previous`'s slot onto `session` without touching the match.
    pub async fn reconnect(
        &self,
        room_id: Uuid,
        session: SessionId,
        previous: SessionId,
        slot: SlotId,
    ) -> Result<(), RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.update(
            room_id,
            MatchCommand::Reconnect {
                session,
                previous,
                slot,
                reply,
            },
        )
        .await?;
        rx.await.map_err(|_| RegistryError::Closed)??;

        self.rooms_by_session.remove(&previous);
        self.rooms_by_session.insert(session, room_id);
        Ok(())
    }

    /// Socket closed: tell the match the session played in, if any.
    pub async fn disconnect(&self, session: SessionId) {
        let Some(room_id) = self.rooms_by_session.get(&session).map(|r| *r) else {
            return;
        };
        if let Err(e) = self
            .update(room_id, MatchCommand::Disconnect { session })
            .await
        {
            log::debug!("disconnect of {session} from {room_id} not delivered: {e}");
        }
    }

    pub fn room_of(&self, session: SessionId) -> Option<Uuid> {
        self.rooms_by_session.get(&session).map(|r| *r)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    fn release(&self, room_id: Uuid) -> Option<MatchEntry> {
        let (_, entry) = self.matches.remove(&room_id)?;
        self.rooms_by_session.retain(|_, room| *room != room_id);
        ACTIVE_MATCHES.dec();
        log::info!("match {room_id} released");
        Some(entry)
    }
}

fn validate_slot_map(player_slots: &HashMap<SessionId, SlotId>) -> Result<(), RegistryError> {
    let mut seen = [false; SLOT_COUNT];
    for &slot in player_slots.values() {
        let Some(taken) = seen.get_mut(slot as usize) else {
            return Err(RegistryError::InvalidSlotMap);
        };
        if *taken {
            return Err(RegistryError::InvalidSlotMap);
        }
        *taken = true;
    }
    Ok(())
}
