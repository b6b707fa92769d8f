//! WebSocket endpoint: one socket loop per connected client.

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::{handle, Message};
use futures::StreamExt;
use uuid::Uuid;

use crate::{
    protocol::{ClientMsg, ServerMsg},
    ws::dispatch::{self, AppState},
};

pub async fn ws_index(
    req: HttpRequest,
    body: web::Payload,
    app: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    // 1 · handshake
    let (response, mut session, mut ws_stream) = handle(&req, body)?;

    // 2 · identity + outbox; the id doubles as the reconnection credential
    let session_id = Uuid::new_v4();
    let mut outbox = app.hub.register(session_id);
    app.hub
        .send(session_id, &ServerMsg::SessionReady { session_id });
    log::info!("WS opened for session {session_id}");

    let app = app.get_ref().clone();

    actix::spawn(async move {
        loop {
            tokio::select! {
                // client → server
                Some(frame) = ws_stream.next() => {
                    match frame {
                        Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(cmsg) => dispatch::handle(&app, session_id, cmsg).await,
                            Err(e) => {
                                log::debug!("bad frame from {session_id}: {e}");
                                app.hub.send(
                                    session_id,
                                    &ServerMsg::GameError { message: format!("malformed frame: {e}") },
                                );
                            }
                        },
                        Ok(Message::Ping(bytes)) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Ok(Message::Close(_)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                // server → client
                Some(json) = outbox.recv() => {
                    if let Err(e) = session.text(json).await {
                        log::warn!("WS send failed for {session_id}: {e:?}");
                        break;
                    }
                }
                else => break,
            }
        }

        // On disconnect …
        dispatch::disconnect(&app, session_id).await;
        let _ = session.close(None).await;
        log::info!("WS closed for session {session_id}");
    });

    Ok(response)
}
