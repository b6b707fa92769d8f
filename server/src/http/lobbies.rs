//! Read-only lobby browser.

use actix_web::{get, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::ws::AppState;

/// GET /api/lobbies
#[get("/lobbies")]
pub async fn list(app: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(app.lobbies.list_open())
}

/// GET /api/lobbies/{lobby_id}
#[get("/lobbies/{lobby_id}")]
pub async fn detail(path: web::Path<Uuid>, app: web::Data<AppState>) -> impl Responder {
    match app.lobbies.get(path.into_inner()) {
        Some(lobby) => HttpResponse::Ok().json(lobby),
        None => HttpResponse::NotFound().body("lobby not found"),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list).service(detail);
}
