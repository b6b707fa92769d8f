//! Routes decoded client frames to the lobby table and the match registry.

use tokio::time::{interval, Duration};
use uuid::Uuid;

use crate::{
    config::settings,
    lobby::{
        manager::LobbyManager,
        session::{CountdownTick, LobbyError, LobbySession, ReadyTransition, SessionId},
    },
    protocol::{ClientMsg, ServerMsg},
    session::{
        actor::MatchCommand,
        registry::{RegistryError, SessionRegistry},
    },
    ws::hub::Hub,
};

/// Shared server state, injected into handlers via `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub lobbies: LobbyManager,
    pub registry: SessionRegistry,
}

impl AppState {
    pub fn new() -> Self {
        let hub = Hub::new();
        Self {
            registry: SessionRegistry::new(hub.clone()),
            lobbies: LobbyManager::new(),
            hub,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn handle(app: &AppState, session: SessionId, msg: ClientMsg) {
    match msg {
        ClientMsg::LobbyCreate { mode, display_name } => {
            let reply = match app.lobbies.create(
                session,
                display_name,
                mode,
                settings().lobby_countdown,
            ) {
                Ok(lobby) => ServerMsg::LobbyCreated { lobby },
                Err(e) => lobby_error(e),
            };
            app.hub.send(session, &reply);
        }

        ClientMsg::LobbyJoin {
            lobby_id,
            display_name,
        } => match app.lobbies.join(lobby_id, session, display_name) {
            Ok(lobby) => broadcast_lobby(&app.hub, lobby),
            Err(e) => {
                app.hub.send(session, &lobby_error(e));
            }
        },

        ClientMsg::LobbyLeave { lobby_id } => leave_lobby(app, lobby_id, session),

        ClientMsg::LobbyReady { lobby_id } => {
            match app
                .lobbies
                .toggle_ready(lobby_id, session, settings().lobby_countdown)
            {
                Ok((lobby, transition)) => {
                    broadcast_lobby(&app.hub, lobby);
                    match transition {
                        ReadyTransition::CountdownStarted { epoch } => {
                            spawn_countdown(app.clone(), lobby_id, epoch)
                        }
                        ReadyTransition::CountdownCancelled => {
                            log::info!("lobby {lobby_id} countdown cancelled")
                        }
                        ReadyTransition::Unchanged => {}
                    }
                }
                Err(e) => {
                    app.hub.send(session, &lobby_error(e));
                }
            }
        }

        ClientMsg::LobbyGet { lobby_id } => {
            let reply = match app.lobbies.get(lobby_id) {
                Some(lobby) => ServerMsg::LobbyInfo { lobby },
                None => lobby_error(LobbyError::NotFound),
            };
            app.hub.send(session, &reply);
        }

        // The lobby and slot map in the frame are the client's echo of
        // `game:start`; the match itself only exists if a countdown made it.
        ClientMsg::GameInit { lobby, .. } => {
            if let Err(e) = app
                .registry
                .update(lobby.id, MatchCommand::Init { session })
                .await
            {
                log::warn!("game:init from {session} for {} refused: {e}", lobby.id);
                app.hub.send(session, &game_error(e));
            }
        }

        ClientMsg::GameAction { room_id, action } => {
            match app.registry.issue_intent(room_id, session, action).await {
                // Invalid intents are dropped silently; the next snapshot
                // shows the authoritative state.
                Ok(()) | Err(RegistryError::Rejected(_)) => {}
                Err(e) => {
                    app.hub.send(session, &game_error(e));
                }
            }
        }

        ClientMsg::GameStateRequest { room_id } => {
            if let Err(e) = app
                .registry
                .update(room_id, MatchCommand::Snapshot { session })
                .await
            {
                app.hub.send(session, &game_error(e));
            }
        }

        ClientMsg::GameReconnect {
            room_id,
            previous_session_id,
            player_slot,
        } => {
            if let Err(e) = app
                .registry
                .reconnect(room_id, session, previous_session_id, player_slot)
                .await
            {
                log::warn!("reconnect of {session} to {room_id} refused: {e}");
                app.hub.send(session, &game_error(e));
            }
        }
    }
}

/// Socket closed: leave any lobby, tell any match, drop the outbox.
pub async fn disconnect(app: &AppState, session: SessionId) {
    app.hub.unregister(session);
    if let Some(lobby_id) = app.lobbies.lobby_of(session) {
        leave_lobby(app, lobby_id, session);
    }
    app.registry.disconnect(session).await;
}

fn leave_lobby(app: &AppState, lobby_id: Uuid, session: SessionId) {
    match app.lobbies.leave(lobby_id, session) {
        Ok(remaining) => {
            app.hub.send(session, &ServerMsg::LobbyLeft { lobby_id });
            if let Some(lobby) = remaining {
                broadcast_lobby(&app.hub, lobby);
            }
        }
        Err(e) => {
            app.hub.send(session, &lobby_error(e));
        }
    }
}

/// One task per countdown; it quits as soon as its epoch goes stale.
fn spawn_countdown(app: AppState, lobby_id: Uuid, epoch: u64) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match app.lobbies.tick_countdown(lobby_id, epoch) {
                None | Some((_, CountdownTick::Stale)) => break,
                Some((lobby, CountdownTick::Remaining(_))) => broadcast_lobby(&app.hub, lobby),
                Some((_, CountdownTick::Elapsed)) => {
                    start_match(&app, lobby_id);
                    break;
                }
            }
        }
    });
}

fn start_match(app: &AppState, lobby_id: Uuid) {
    let (lobby, assignment) = match app.lobbies.start(lobby_id, &mut rand::rng()) {
        Ok(started) => started,
        Err(e) => {
            log::warn!("lobby {lobby_id} could not start: {e}");
            return;
        }
    };
    let members: Vec<SessionId> = lobby.members.iter().map(|m| m.session_id).collect();
    if let Err(e) = app
        .registry
        .create(lobby.id, assignment.player_slots.clone())
    {
        log::error!("match for lobby {lobby_id} not created: {e}");
        app.hub.broadcast(&members, &game_error(e));
        return;
    }
    app.hub.broadcast(
        &members,
        &ServerMsg::GameStart {
            lobby,
            player_slot_map: assignment.player_slots,
        },
    );
}

fn broadcast_lobby(hub: &Hub, lobby: LobbySession) {
    let members: Vec<SessionId> = lobby.members.iter().map(|m| m.session_id).collect();
    hub.broadcast(&members, &ServerMsg::LobbyUpdated { lobby });
}

fn lobby_error(e: LobbyError) -> ServerMsg {
    ServerMsg::LobbyError {
        message: e.to_string(),
    }
}

fn game_error(e: RegistryError) -> ServerMsg {
    ServerMsg::GameError {
        message: e.to_string(),
    }
}
