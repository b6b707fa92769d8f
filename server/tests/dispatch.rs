//! Lobby → match hand-off through the frame router.

use std::{collections::HashMap, sync::Once};

use serde_json::Value;
use siegelane_server::{
    lobby::{LobbyMode, LobbySession},
    protocol::ClientMsg,
    ws::dispatch::{self, AppState},
};
use tokio::{
    sync::mpsc::UnboundedReceiver,
    time::{timeout, Duration},
};
use uuid::Uuid;

static FAST_COUNTDOWN: Once = Once::new();

fn app() -> AppState {
    // must run before anything reads the settings
    FAST_COUNTDOWN.call_once(|| std::env::set_var("LOBBY_COUNTDOWN_SECS", "1"));
    AppState::new()
}

async fn next_event(rx: &mut UnboundedReceiver<String>, event: &str) -> Value {
    timeout(Duration::from_secs(5), async {
        loop {
            let json = rx.recv().await.expect("outbox closed");
            let frame: Value = serde_json::from_str(&json).unwrap();
            if frame["event"] == event {
                return frame["data"].clone();
            }
        }
    })
    .await
    .expect("event never arrived")
}

#[tokio::test]
async fn solo_lobby_counts_down_into_a_match() {
    let app = app();
    let me = Uuid::new_v4();
    let mut outbox = app.hub.register(me);

    dispatch::handle(
        &app,
        me,
        ClientMsg::LobbyCreate {
            mode: LobbyMode::Solo,
            display_name: "me".into(),
        },
    )
    .await;
    let created = next_event(&mut outbox, "lobby:created").await;
    let lobby_id: Uuid = serde_json::from_value(created["lobby"]["id"].clone()).unwrap();

    dispatch::handle(&app, me, ClientMsg::LobbyReady { lobby_id }).await;
    let updated = next_event(&mut outbox, "lobby:updated").await;
    assert_eq!(updated["lobby"]["isStarting"], true);

    let start = next_event(&mut outbox, "game:start").await;
    let slot = start["playerSlotMap"][me.to_string()].as_u64().unwrap();
    assert!(slot < 4);
    assert!(app.registry.get(lobby_id).is_some());
    assert!(app.lobbies.get(lobby_id).is_none());

    let lobby = serde_json::from_value(start["lobby"].clone()).unwrap();
    let player_slot_map = serde_json::from_value(start["playerSlotMap"].clone()).unwrap();
    dispatch::handle(
        &app,
        me,
        ClientMsg::GameInit {
            lobby,
            player_slot_map,
        },
    )
    .await;
    let snapshot = next_event(&mut outbox, "game:state").await;
    assert_eq!(snapshot["aiSlots"].as_array().unwrap().len(), 3);

    dispatch::disconnect(&app, me).await;
    timeout(Duration::from_secs(2), async {
        while app.registry.get(lobby_id).is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("match outlived its last player");
}

#[tokio::test]
async fn unready_cancels_the_countdown() {
    let app = app();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut inbox_a = app.hub.register(a);
    app.hub.register(b);

    dispatch::handle(
        &app,
        a,
        ClientMsg::LobbyCreate {
            mode: LobbyMode::Duo,
            display_name: "a".into(),
        },
    )
    .await;
    let created = next_event(&mut inbox_a, "lobby:created").await;
    let lobby_id: Uuid = serde_json::from_value(created["lobby"]["id"].clone()).unwrap();
    dispatch::handle(
        &app,
        b,
        ClientMsg::LobbyJoin {
            lobby_id,
            display_name: "b".into(),
        },
    )
    .await;
    dispatch::handle(&app, a, ClientMsg::LobbyReady { lobby_id }).await;
    dispatch::handle(&app, b, ClientMsg::LobbyReady { lobby_id }).await;
    assert!(app.lobbies.get(lobby_id).unwrap().is_starting);

    dispatch::handle(&app, b, ClientMsg::LobbyReady { lobby_id }).await;
    assert!(!app.lobbies.get(lobby_id).unwrap().is_starting);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(app.registry.get(lobby_id).is_none());
    assert!(app.lobbies.get(lobby_id).is_some());
}

#[tokio::test]
async fn errors_go_back_to_the_requester() {
    let app = app();
    let me = Uuid::new_v4();
    let mut outbox = app.hub.register(me);

    dispatch::handle(&app, me, ClientMsg::LobbyGet { lobby_id: Uuid::new_v4() }).await;
    let err = next_event(&mut outbox, "lobby:error").await;
    assert_eq!(err["message"], "Lobby not found");

    dispatch::handle(
        &app,
        me,
        ClientMsg::GameStateRequest {
            room_id: Uuid::new_v4(),
        },
    )
    .await;
    let err = next_event(&mut outbox, "game:error").await;
    assert!(err["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn leaving_broadcasts_to_the_rest() {
    let app = app();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut inbox_a = app.hub.register(a);
    let mut inbox_b = app.hub.register(b);

    dispatch::handle(
        &app,
        a,
        ClientMsg::LobbyCreate {
            mode: LobbyMode::Quad,
            display_name: "a".into(),
        },
    )
    .await;
    let created = next_event(&mut inbox_a, "lobby:created").await;
    let lobby_id: Uuid = serde_json::from_value(created["lobby"]["id"].clone()).unwrap();
    dispatch::handle(
        &app,
        b,
        ClientMsg::LobbyJoin {
            lobby_id,
            display_name: "b".into(),
        },
    )
    .await;

    dispatch::disconnect(&app, a).await;

    let update = next_event(&mut inbox_b, "lobby:updated").await;
    let members = update["lobby"]["members"].as_array().unwrap();
    // the join broadcast came first; drain to the departure
    let update = if members.len() == 2 {
        next_event(&mut inbox_b, "lobby:updated").await
    } else {
        update
    };
    assert_eq!(update["lobby"]["members"].as_array().unwrap().len(), 1);
    assert_eq!(update["lobby"]["host"], b.to_string());
}

#[tokio::test]
async fn game_init_never_creates_a_match() {
    let app = app();
    let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
    let mut outbox = app.hub.register(me);

    // a lobby no countdown ever finished, with a self-chosen slot map
    let lobby = LobbySession::new(me, "me".into(), LobbyMode::Duo, 15);
    dispatch::handle(
        &app,
        me,
        ClientMsg::GameInit {
            lobby,
            player_slot_map: HashMap::from([(me, 0), (other, 1)]),
        },
    )
    .await;

    let err = next_event(&mut outbox, "game:error").await;
    assert!(err["message"].as_str().unwrap().contains("not found"));
    assert_eq!(app.registry.len(), 0);
}
