use rand::{rngs::StdRng, SeedableRng};
use siegelane_server::lobby::{
    session::{ReadyTransition, SessionId},
    LobbyError, LobbyManager, LobbyMode,
};
use uuid::Uuid;

fn sid() -> SessionId {
    Uuid::new_v4()
}

#[test]
fn a_session_belongs_to_one_lobby_at_a_time() {
    let lobbies = LobbyManager::new();
    let host = sid();
    let lobby = lobbies
        .create(host, "host".into(), LobbyMode::Trio, 15)
        .unwrap();

    assert_eq!(
        lobbies
            .create(host, "again".into(), LobbyMode::Solo, 15)
            .unwrap_err(),
        LobbyError::AlreadyInLobby
    );

    let other = lobbies
        .create(sid(), "other".into(), LobbyMode::Duo, 15)
        .unwrap();
    assert_eq!(
        lobbies.join(other.id, host, "host".into()).unwrap_err(),
        LobbyError::AlreadyInLobby
    );
    assert_eq!(lobbies.lobby_of(host), Some(lobby.id));
}

#[test]
fn join_leave_and_host_handover() {
    let lobbies = LobbyManager::new();
    let (a, b) = (sid(), sid());
    let lobby = lobbies.create(a, "a".into(), LobbyMode::Trio, 15).unwrap();
    let joined = lobbies.join(lobby.id, b, "b".into()).unwrap();
    assert_eq!(joined.members.len(), 2);

    let after = lobbies.leave(lobby.id, a).unwrap().unwrap();
    assert_eq!(after.host, b);
    assert!(after.members[0].is_host);
    assert_eq!(lobbies.lobby_of(a), None);

    // last one out closes the lobby
    assert_eq!(lobbies.leave(lobby.id, b).unwrap(), None);
    assert!(lobbies.get(lobby.id).is_none());
}

#[test]
fn unknown_lobby_is_an_error() {
    let lobbies = LobbyManager::new();
    assert_eq!(
        lobbies.join(Uuid::new_v4(), sid(), "x".into()).unwrap_err(),
        LobbyError::NotFound
    );
}

#[test]
fn open_listing_hides_full_lobbies() {
    let lobbies = LobbyManager::new();
    let solo = lobbies.create(sid(), "s".into(), LobbyMode::Solo, 15).unwrap();
    let quad = lobbies.create(sid(), "q".into(), LobbyMode::Quad, 15).unwrap();

    let open: Vec<Uuid> = lobbies.list_open().iter().map(|l| l.id).collect();
    assert!(open.contains(&quad.id));
    assert!(!open.contains(&solo.id));
}

#[test]
fn start_assigns_slots_and_hands_the_lobby_off() {
    let lobbies = LobbyManager::new();
    let (a, b) = (sid(), sid());
    let lobby = lobbies.create(a, "a".into(), LobbyMode::Duo, 1).unwrap();
    lobbies.join(lobby.id, b, "b".into()).unwrap();
    lobbies.toggle_ready(lobby.id, a, 1).unwrap();
    let (_, transition) = lobbies.toggle_ready(lobby.id, b, 1).unwrap();
    let ReadyTransition::CountdownStarted { epoch } = transition else {
        panic!("countdown did not start: {transition:?}");
    };
    assert!(lobbies.tick_countdown(lobby.id, epoch).is_some());

    let (started, assignment) = lobbies
        .start(lobby.id, &mut StdRng::seed_from_u64(11))
        .unwrap();

    assert!(started.is_started);
    assert_eq!(assignment.player_slots.len(), 2);
    assert_ne!(assignment.player_slots[&a], assignment.player_slots[&b]);
    assert_eq!(assignment.bot_slots.len(), 2);
    assert!(lobbies.get(lobby.id).is_none());
    assert_eq!(lobbies.lobby_of(a), None);
    assert_eq!(
        lobbies.join(lobby.id, sid(), "late".into()).unwrap_err(),
        LobbyError::NotFound
    );
}
