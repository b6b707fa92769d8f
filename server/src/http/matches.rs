//! Spectator access to the latest published match snapshot.

use actix_web::{get, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::ws::AppState;

/// GET /api/matches/{room_id}
#[get("/matches/{room_id}")]
pub async fn snapshot(path: web::Path<Uuid>, app: web::Data<AppState>) -> impl Responder {
    let Some(handle) = app.registry.get(path.into_inner()) else {
        return HttpResponse::NotFound().body("match not found");
    };
    let state = handle.subscribe().borrow().clone();
    HttpResponse::Ok().json(state)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(snapshot);
}
