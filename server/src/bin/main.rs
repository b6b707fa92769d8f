use actix_web::{middleware::Logger, web, App, HttpServer};
use siegelane_server::{config::settings, http, metrics, ws};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let server_addr = settings().server_addr.clone();
    log::info!(
        "starting on {server_addr} (tick {} ms, snapshot every {} ms)",
        settings().tick_ms,
        settings().broadcast_ms
    );

    // Lobbies, live matches and socket outboxes are shared by every worker.
    let app_state = web::Data::new(ws::AppState::new());

    // Start HTTP + WS server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(app_state.clone())
            .configure(http::routes::init_routes)
            .configure(ws::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await?;
    Ok(())
}
