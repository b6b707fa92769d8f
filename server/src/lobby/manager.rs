//! Process-wide lobby table plus the session → lobby membership index.

use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use uuid::Uuid;

use crate::{
    lobby::session::{
        CountdownTick, LobbyError, LobbyMode, LobbySession, ReadyTransition, SessionId,
        SlotAssignment,
    },
    metrics::OPEN_LOBBIES,
};

#[derive(Clone, Default)]
pub struct LobbyManager {
    lobbies: Arc<DashMap<Uuid, LobbySession>>,
    membership: Arc<DashMap<SessionId, Uuid>>,
}

impl LobbyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        host: SessionId,
        name: String,
        mode: LobbyMode,
        countdown: u32,
    ) -> Result<LobbySession, LobbyError> {
        if self.membership.contains_key(&host) {
            return Err(LobbyError::AlreadyInLobby);
        }
        let lobby = LobbySession::new(host, name, mode, countdown);
        self.membership.insert(host, lobby.id);
        self.lobbies.insert(lobby.id, lobby.clone());
        OPEN_LOBBIES.inc();
        log::info!("lobby {} created by {host} ({mode:?})", lobby.id);
        Ok(lobby)
    }

    pub fn join(
        &self,
        lobby_id: Uuid,
        session: SessionId,
        name: String,
    ) -> Result<LobbySession, LobbyError> {
        if self.membership.contains_key(&session) {
            return Err(LobbyError::AlreadyInLobby);
        }
        let mut lobby = self.lobbies.get_mut(&lobby_id).ok_or(LobbyError::NotFound)?;
        lobby.join(session, name)?;
        self.membership.insert(session, lobby_id);
        Ok(lobby.value().clone())
    }

    /// Returns the remaining lobby, or `None` when the last member left and
    /// the lobby was removed.
    pub fn leave(
        &self,
        lobby_id: Uuid,
        session: SessionId,
    ) -> Result<Option<LobbySession>, LobbyError> {
        let remaining = {
            let mut lobby = self.lobbies.get_mut(&lobby_id).ok_or(LobbyError::NotFound)?;
            let empty = lobby.leave(session)?;
            (!empty).then(|| lobby.value().clone())
        };
        self.membership.remove(&session);
        if remaining.is_none() {
            self.remove(lobby_id);
        }
        Ok(remaining)
    }

    pub fn toggle_ready(
        &self,
        lobby_id: Uuid,
        session: SessionId,
        countdown: u32,
    ) -> Result<(LobbySession, ReadyTransition), LobbyError> {
        let mut lobby = self.lobbies.get_mut(&lobby_id).ok_or(LobbyError::NotFound)?;
        let transition = lobby.toggle_ready(session, countdown)?;
        Ok((lobby.value().clone(), transition))
    }

    /// Advances the countdown owned by `epoch`; `None` once the lobby is gone.
    pub fn tick_countdown(&self, lobby_id: Uuid, epoch: u64) -> Option<(LobbySession, CountdownTick)> {
        let mut lobby = self.lobbies.get_mut(&lobby_id)?;
        let tick = lobby.tick_countdown(epoch);
        Some((lobby.value().clone(), tick))
    }

    /// Assigns slots and hands the lobby off: it leaves the table and its
    /// members become free to join another lobby.
    pub fn start<R: Rng>(
        &self,
        lobby_id: Uuid,
        rng: &mut R,
    ) -> Result<(LobbySession, SlotAssignment), LobbyError> {
        let (_, mut lobby) = self.lobbies.remove(&lobby_id).ok_or(LobbyError::NotFound)?;
        OPEN_LOBBIES.dec();
        let assignment = lobby.assign_slots(rng)?;
        for m in &lobby.members {
            self.membership.remove(&m.session_id);
        }
        log::info!(
            "lobby {lobby_id} started: players {:?}, bots {:?}",
            assignment.player_slots,
            assignment.bot_slots
        );
        Ok((lobby, assignment))
    }

    pub fn get(&self, lobby_id: Uuid) -> Option<LobbySession> {
        self.lobbies.get(&lobby_id).map(|l| l.value().clone())
    }

    pub fn lobby_of(&self, session: SessionId) -> Option<Uuid> {
        self.membership.get(&session).map(|id| *id)
    }

    /// Lobbies still accepting members.
    pub fn list_open(&self) -> Vec<LobbySession> {
        self.lobbies
            .iter()
            .filter(|l| !l.is_started && !l.is_full())
            .map(|l| l.value().clone())
            .collect()
    }

    fn remove(&self, lobby_id: Uuid) {
        if self.lobbies.remove(&lobby_id).is_some() {
            OPEN_LOBBIES.dec();
            log::info!("lobby {lobby_id} closed");
        }
    }
}
