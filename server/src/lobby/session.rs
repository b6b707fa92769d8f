//! Pre-match coordination: membership, ready states, countdown and slot
//! assignment for one lobby.

use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{constants::SLOT_COUNT, types::SlotId};

/// Transport-level identity of one connected socket.
pub type SessionId = Uuid;

/// Human/bot mix of a match.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LobbyMode {
    /// 1 human + 3 bots
    Solo,
    /// 2 humans + 2 bots
    Duo,
    /// 3 humans + 1 bot
    Trio,
    /// 4 humans
    Quad,
}

impl LobbyMode {
    pub fn human_count(self) -> usize {
        match self {
            LobbyMode::Solo => 1,
            LobbyMode::Duo => 2,
            LobbyMode::Trio => 3,
            LobbyMode::Quad => 4,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LobbyMember {
    pub session_id: SessionId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub slot: Option<SlotId>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LobbySession {
    pub id: Uuid,
    pub host: SessionId,
    pub mode: LobbyMode,
    /// Join order; the first entry inherits host on departure.
    pub members: Vec<LobbyMember>,
    pub capacity: usize,
    pub countdown: u32,
    pub is_starting: bool,
    pub is_started: bool,
    /// Bumped on every countdown start so stale timers can tell they lost.
    #[serde(skip)]
    countdown_epoch: u64,
}

/// Result of a ready toggle, as far as the countdown is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyTransition {
    Unchanged,
    CountdownStarted { epoch: u64 },
    CountdownCancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// The countdown this timer belongs to was cancelled or replaced.
    Stale,
    Remaining(u32),
    Elapsed,
}

/// Which humans got which slots; every other slot is bot-controlled.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    pub player_slots: HashMap<SessionId, SlotId>,
    pub bot_slots: Vec<SlotId>,
}

impl LobbySession {
    /// Create a new lobby with the creator as host and first member.
    pub fn new(host: SessionId, name: String, mode: LobbyMode, countdown: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            host,
            mode,
            members: vec![LobbyMember {
                session_id: host,
                name,
                is_host: true,
                is_ready: false,
                slot: None,
            }],
            capacity: mode.human_count(),
            countdown,
            is_starting: false,
            is_started: false,
            countdown_epoch: 0,
        }
    }

    pub fn member(&self, session: SessionId) -> Option<&LobbyMember> {
        self.members.iter().find(|m| m.session_id == session)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn join(&mut self, session: SessionId, name: String) -> Result<(), LobbyError> {
        if self.is_started {
            return Err(LobbyError::GameAlreadyStarted);
        }
        if self.member(session).is_some() {
            return Err(LobbyError::AlreadyInLobby);
        }
        if self.is_full() {
            return Err(LobbyError::LobbyFull);
        }
        self.members.push(LobbyMember {
            session_id: session,
            name,
            is_host: false,
            is_ready: false,
            slot: None,
        });
        Ok(())
    }

    /// Removes a member, reassigning host and cancelling a running
    /// countdown. Returns `true` when the lobby is now empty.
    pub fn leave(&mut self, session: SessionId) -> Result<bool, LobbyError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.session_id == session)
            .ok_or(LobbyError::NotInLobby)?;
        self.members.remove(idx);

        if self.host == session {
            if let Some(first) = self.members.first_mut() {
                first.is_host = true;
                self.host = first.session_id;
            }
        }
        if self.is_starting {
            self.cancel_countdown();
        }
        Ok(self.members.is_empty())
    }

    pub fn toggle_ready(
        &mut self,
        session: SessionId,
        countdown: u32,
    ) -> Result<ReadyTransition, LobbyError> {
        if self.is_started {
            return Err(LobbyError::GameAlreadyStarted);
        }
        let member = self
            .members
            .iter_mut()
            .find(|m| m.session_id == session)
            .ok_or(LobbyError::NotInLobby)?;
        member.is_ready = !member.is_ready;

        if self.is_starting && !self.all_ready() {
            self.cancel_countdown();
            return Ok(ReadyTransition::CountdownCancelled);
        }
        if !self.is_starting && self.can_start() {
            self.is_starting = true;
            self.countdown = countdown;
            self.countdown_epoch += 1;
            return Ok(ReadyTransition::CountdownStarted {
                epoch: self.countdown_epoch,
            });
        }
        Ok(ReadyTransition::Unchanged)
    }

    fn all_ready(&self) -> bool {
        self.members.iter().all(|m| m.is_ready)
    }

    /// Capacity reached and every member ready.
    pub fn can_start(&self) -> bool {
        !self.is_started && self.is_full() && self.all_ready()
    }

    fn cancel_countdown(&mut self) {
        self.is_starting = false;
        self.countdown_epoch += 1;
    }

    /// One second of countdown for the timer started at `epoch`.
    pub fn tick_countdown(&mut self, epoch: u64) -> CountdownTick {
        if !self.is_starting || self.is_started || epoch != self.countdown_epoch {
            return CountdownTick::Stale;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            CountdownTick::Elapsed
        } else {
            CountdownTick::Remaining(self.countdown)
        }
    }

    /// Permutes the four slots uniformly; ready members take the prefix in
    /// join order and the rest become bots. Marks the lobby started.
    pub fn assign_slots<R: Rng>(&mut self, rng: &mut R) -> Result<SlotAssignment, LobbyError> {
        if self.is_started {
            return Err(LobbyError::GameAlreadyStarted);
        }
        let mut order: Vec<SlotId> = (0..SLOT_COUNT as SlotId).collect();
        order.shuffle(rng);

        let mut player_slots = HashMap::new();
        let mut next = order.iter().copied();
        for member in self.members.iter_mut().filter(|m| m.is_ready) {
            let Some(slot) = next.next() else { break };
            member.slot = Some(slot);
            player_slots.insert(member.session_id, slot);
        }
        let mut bot_slots: Vec<SlotId> = next.collect();
        bot_slots.sort_unstable();

        self.is_starting = false;
        self.is_started = true;
        Ok(SlotAssignment {
            player_slots,
            bot_slots,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LobbyError {
    #[error("Lobby not found")]
    NotFound,
    #[error("Lobby is full")]
    LobbyFull,
    #[error("Game has already started")]
    GameAlreadyStarted,
    #[error("Player already in a lobby")]
    AlreadyInLobby,
    #[error("Player not in lobby")]
    NotInLobby,
}
