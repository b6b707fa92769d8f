use std::collections::HashMap;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::Value;
use siegelane_server::{http, lobby::LobbyMode, ws::AppState};
use uuid::Uuid;

#[actix_rt::test]
async fn healthz_reports_counts() {
    let state = AppState::new();
    state
        .lobbies
        .create(Uuid::new_v4(), "host".into(), LobbyMode::Trio, 15)
        .unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(http::routes::init_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/healthz").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["openLobbies"], 1);
    assert_eq!(body["activeMatches"], 0);
}

#[actix_rt::test]
async fn lobby_browser() {
    let state = AppState::new();
    let lobby = state
        .lobbies
        .create(Uuid::new_v4(), "host".into(), LobbyMode::Duo, 15)
        .unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(http::routes::init_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/lobbies").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed[0]["id"], lobby.id.to_string());

    let req = test::TestRequest::get()
        .uri(&format!("/api/lobbies/{}", lobby.id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["mode"], "duo");

    let req = test::TestRequest::get()
        .uri(&format!("/api/lobbies/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn match_snapshot_for_spectators() {
    let state = AppState::new();
    let room = Uuid::new_v4();
    state
        .registry
        .create(room, HashMap::from([(Uuid::new_v4(), 0)]))
        .unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(http::routes::init_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/matches/{room}"))
        .to_request();
    let snapshot: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(snapshot["slots"].as_array().unwrap().len(), 4);
    assert_eq!(snapshot["slots"][3]["isBot"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/matches/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
