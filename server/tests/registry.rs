//! Match registry and the per-match task.

use std::collections::HashMap;

use serde_json::Value;
use siegelane_server::{
    game::{
        intent::Rejection,
        types::{Intent, IntentKind, StatKind},
    },
    lobby::session::SessionId,
    session::{MatchCommand, RegistryError, SessionRegistry},
    ws::hub::Hub,
};
use tokio::{
    sync::mpsc::UnboundedReceiver,
    time::{sleep, timeout, Duration},
};
use uuid::Uuid;

fn upgrade(slot: u8) -> Intent {
    Intent::new(
        slot,
        IntentKind::UpgradeStat {
            stat: StatKind::GoldIncome,
        },
    )
}

/// Next frame of the given event, skipping everything else.
async fn next_event(rx: &mut UnboundedReceiver<String>, event: &str) -> Value {
    timeout(Duration::from_secs(3), async {
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

fn setup() -> (Hub, SessionRegistry, Uuid, SessionId) {
    let hub = Hub::new();
    let registry = SessionRegistry::new(hub.clone());
    let room = Uuid::new_v4();
    let player = Uuid::new_v4();
    registry
        .create(room, HashMap::from([(player, 2)]))
        .unwrap();
    (hub, registry, room, player)
}

#[tokio::test]
async fn create_fills_missing_slots_with_bots() {
    let (_, registry, room, _) = setup();
    let handle = registry.get(room).unwrap();

    let state = handle.subscribe().borrow().clone();
    assert_eq!(state.bot_slots(), vec![0, 1, 3]);
    assert!(!state.slot(2).unwrap().is_bot);

    assert_eq!(
        registry.create(room, HashMap::new()).unwrap_err(),
        RegistryError::RoomExists(room)
    );
}

#[tokio::test]
async fn slot_maps_are_validated() {
    let registry = SessionRegistry::new(Hub::new());
    let dup = HashMap::from([(Uuid::new_v4(), 1), (Uuid::new_v4(), 1)]);
    assert_eq!(
        registry.create(Uuid::new_v4(), dup).unwrap_err(),
        RegistryError::InvalidSlotMap
    );
    let out_of_range = HashMap::from([(Uuid::new_v4(), 4)]);
    assert_eq!(
        registry.create(Uuid::new_v4(), out_of_range).unwrap_err(),
        RegistryError::InvalidSlotMap
    );
}

#[tokio::test]
async fn intents_go_through_the_single_writer() {
    let (hub, registry, room, player) = setup();
    let mut outbox = hub.register(player);

    registry.issue_intent(room, player, upgrade(2)).await.unwrap();

    let snapshot = registry.get(room).unwrap().subscribe().borrow().clone();
    assert_eq!(snapshot.slot(2).unwrap().gold, 150);
    let state = next_event(&mut outbox, "game:state").await;
    assert_eq!(state["gameState"]["slots"][2]["gold"], 150);
    assert!(state.get("aiSlots").is_none());

    assert_eq!(
        registry
            .issue_intent(room, player, upgrade(1))
            .await
            .unwrap_err(),
        RegistryError::Rejected(Rejection::SlotMismatch {
            declared: 1,
            issuer: 2
        })
    );
    assert_eq!(
        registry
            .issue_intent(room, Uuid::new_v4(), upgrade(2))
            .await
            .unwrap_err(),
        RegistryError::NotAPlayer
    );
}

#[tokio::test]
async fn accepted_actions_are_relayed_to_the_other_players() {
    let hub = Hub::new();
    let registry = SessionRegistry::new(hub.clone());
    let room = Uuid::new_v4();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    registry
        .create(room, HashMap::from([(a, 0), (b, 1)]))
        .unwrap();
    let mut inbox_b = hub.register(b);

    let intent = upgrade(0);
    registry.issue_intent(room, a, intent.clone()).await.unwrap();

    let relay = next_event(&mut inbox_b, "game:action").await;
    assert_eq!(relay["roomId"], room.to_string());
    assert_eq!(relay["action"]["id"], intent.id.to_string());
}

#[tokio::test]
async fn init_starts_the_clock_and_sends_a_full_snapshot() {
    let (hub, registry, room, player) = setup();
    let mut outbox = hub.register(player);

    registry
        .update(room, MatchCommand::Init { session: player })
        .await
        .unwrap();
    let first = next_event(&mut outbox, "game:state").await;
    assert_eq!(first["aiSlots"], serde_json::json!([0, 1, 3]));
    assert_eq!(first["playerSlotMap"][player.to_string()], 2);

    sleep(Duration::from_millis(300)).await;
    registry
        .update(room, MatchCommand::Snapshot { session: player })
        .await
        .unwrap();
    let later = next_event(&mut outbox, "game:state").await;
    assert!(later["gameState"]["matchTime"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn init_snapshot_reaches_every_connected_player() {
    let hub = Hub::new();
    let registry = SessionRegistry::new(hub.clone());
    let room = Uuid::new_v4();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    registry
        .create(room, HashMap::from([(a, 0), (b, 3)]))
        .unwrap();
    let mut inbox_b = hub.register(b);

    registry
        .update(room, MatchCommand::Init { session: a })
        .await
        .unwrap();

    let state = next_event(&mut inbox_b, "game:state").await;
    assert_eq!(state["aiSlots"], serde_json::json!([1, 2]));
    assert_eq!(state["playerSlotMap"][a.to_string()], 0);
}

#[tokio::test]
async fn reconnect_moves_the_slot_to_the_new_session() {
    let (hub, registry, room, player) = setup();
    let fresh = Uuid::new_v4();
    let mut outbox = hub.register(fresh);

    assert_eq!(
        registry.reconnect(room, fresh, player, 1).await.unwrap_err(),
        RegistryError::BadReconnect
    );
    registry.reconnect(room, fresh, player, 2).await.unwrap();

    let ack = next_event(&mut outbox, "game:reconnected").await;
    assert_eq!(ack["playerSlot"], 2);
    assert_eq!(registry.room_of(fresh), Some(room));
    assert_eq!(registry.room_of(player), None);

    registry.issue_intent(room, fresh, upgrade(2)).await.unwrap();
    assert_eq!(
        registry
            .issue_intent(room, player, upgrade(2))
            .await
            .unwrap_err(),
        RegistryError::NotAPlayer
    );
}

#[tokio::test]
async fn last_disconnect_releases_the_match() {
    let (_, registry, room, player) = setup();

    registry.disconnect(player).await;

    timeout(Duration::from_secs(2), async {
        while registry.get(room).is_some() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("match was never released");
    assert_eq!(registry.room_of(player), None);
}

#[tokio::test]
async fn delete_stops_the_task() {
    let (_, registry, room, player) = setup();
    let handle = registry.get(room).unwrap();

    assert!(registry.delete(room));
    assert!(!registry.delete(room));
    assert!(registry.get(room).is_none());

    sleep(Duration::from_millis(20)).await;
    assert_eq!(
        handle.issue_intent(player, upgrade(2)).await.unwrap_err(),
        RegistryError::Closed
    );
}
