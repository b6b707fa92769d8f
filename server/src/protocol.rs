//! Wire-protocol shared by client, WS handler and match sessions.
//!
//! Every frame is `{"event": "<name>", "data": {...}}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::{
    game::types::{Intent, MatchState, SlotId},
    lobby::session::{LobbyMode, LobbySession, SessionId},
};

/// Session id → assigned slot for the humans of a match.
pub type PlayerSlotMap = HashMap<SessionId, SlotId>;

// ---------- client → server ----------
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMsg {
    #[serde(rename = "lobby:create", rename_all = "camelCase")]
    LobbyCreate {
        mode: LobbyMode,
        display_name: String,
    },
    #[serde(rename = "lobby:join", rename_all = "camelCase")]
    LobbyJoin { lobby_id: Uuid, display_name: String },
    #[serde(rename = "lobby:leave", rename_all = "camelCase")]
    LobbyLeave { lobby_id: Uuid },
    #[serde(rename = "lobby:ready", rename_all = "camelCase")]
    LobbyReady { lobby_id: Uuid },
    #[serde(rename = "lobby:get", rename_all = "camelCase")]
    LobbyGet { lobby_id: Uuid },
    #[serde(rename = "game:init", rename_all = "camelCase")]
    GameInit {
        lobby: LobbySession,
        player_slot_map: PlayerSlotMap,
    },
    #[serde(rename = "game:action", rename_all = "camelCase")]
    GameAction { room_id: Uuid, action: Intent },
    #[serde(rename = "game:state:request", rename_all = "camelCase")]
    GameStateRequest { room_id: Uuid },
    /// Sent by a client that lost its socket and re-opened a new one.
    #[serde(rename = "game:reconnect", rename_all = "camelCase")]
    GameReconnect {
        room_id: Uuid,
        previous_session_id: SessionId,
        player_slot: SlotId,
    },
}

// ---------- server → client ----------
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "event", content = "data")]
pub enum ServerMsg {
    /// First frame on every socket; the id is the reconnection credential.
    #[serde(rename = "session:ready", rename_all = "camelCase")]
    SessionReady { session_id: SessionId },
    #[serde(rename = "lobby:created", rename_all = "camelCase")]
    LobbyCreated { lobby: LobbySession },
    #[serde(rename = "lobby:updated", rename_all = "camelCase")]
    LobbyUpdated { lobby: LobbySession },
    #[serde(rename = "lobby:left", rename_all = "camelCase")]
    LobbyLeft { lobby_id: Uuid },
    #[serde(rename = "lobby:info", rename_all = "camelCase")]
    LobbyInfo { lobby: LobbySession },
    #[serde(rename = "lobby:error", rename_all = "camelCase")]
    LobbyError { message: String },
    #[serde(rename = "game:start", rename_all = "camelCase")]
    GameStart {
        lobby: LobbySession,
        player_slot_map: PlayerSlotMap,
    },
    #[serde(rename = "game:state", rename_all = "camelCase")]
    GameState {
        game_state: MatchState,
        ai_slots: Option<Vec<SlotId>>,
        player_slot_map: Option<PlayerSlotMap>,
    },
    /// Relay of another member's accepted action.
    #[serde(rename = "game:action", rename_all = "camelCase")]
    GameAction { room_id: Uuid, action: Intent },
    #[serde(rename = "game:reconnected", rename_all = "camelCase")]
    GameReconnected { room_id: Uuid, player_slot: SlotId },
    #[serde(rename = "game:error", rename_all = "camelCase")]
    GameError { message: String },
}
