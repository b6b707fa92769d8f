pub mod dispatch;
pub mod hub;
pub mod index;

use actix_web::web;

pub use dispatch::AppState;

/// Mount the WebSocket endpoint at `/ws/`.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws/", web::get().to(index::ws_index));
}
