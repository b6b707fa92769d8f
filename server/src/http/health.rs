//! Simple liveness probe

use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

use crate::ws::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    open_lobbies: usize,
    active_matches: usize,
}

#[get("/healthz")]
pub async fn healthz(app: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(Health {
        status: "ok",
        open_lobbies: app.lobbies.list_open().len(),
        active_matches: app.registry.len(),
    })
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
