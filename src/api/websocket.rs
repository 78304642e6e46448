//! Run update stream over WebSocket.
//!
//! Every client gets a `run_updated` frame whenever a run settles. Frames
//! carry only the run id; clients re-fetch the run over HTTP.

use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::models::WsEventMessage;
use crate::services::EventBroadcaster;

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Grace period after a missed ping before the client is dropped.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Upgrade to a WebSocket and start streaming run updates.
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    broadcaster: web::Data<EventBroadcaster>,
) -> Result<HttpResponse, actix_web::Error> {
    let peer = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    let (response, session, inbound) = actix_ws::handle(&req, stream)?;
    info!(client = %peer, "Run update stream opened");

    let client = RunFeedClient {
        peer,
        session,
        updates: broadcaster.subscribe(),
        last_pong: Instant::now(),
    };
    actix_web::rt::spawn(client.serve(inbound));

    Ok(response)
}

/// One connected dashboard.
struct RunFeedClient {
    peer: String,
    session: Session,
    updates: broadcast::Receiver<WsEventMessage>,
    last_pong: Instant,
}

impl RunFeedClient {
    async fn serve(mut self, mut inbound: MessageStream) {
        let mut ticker = tokio::time::interval(PING_INTERVAL);

        loop {
            let flow = tokio::select! {
                Some(frame) = inbound.next() => self.on_inbound(frame).await,
                update = self.updates.recv() => self.on_update(update).await,
                _ = ticker.tick() => self.on_tick().await,
            };
            if flow.is_break() {
                break;
            }
        }

        let _ = self.session.close(None).await;
        info!(client = %self.peer, "Run update stream closed");
    }

    async fn on_inbound(
        &mut self,
        frame: Result<Message, actix_ws::ProtocolError>,
    ) -> ControlFlow<()> {
        match frame {
            Ok(Message::Ping(bytes)) => {
                if self.session.pong(&bytes).await.is_err() {
                    return ControlFlow::Break(());
                }
            }
            Ok(Message::Pong(_)) => self.last_pong = Instant::now(),
            Ok(Message::Close(reason)) => {
                debug!(client = %self.peer, reason = ?reason, "Client closed stream");
                return ControlFlow::Break(());
            }
            // Listen-only stream
            Ok(_) => {}
            Err(e) => {
                warn!(client = %self.peer, error = %e, "WebSocket protocol error");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn on_update(&mut self, update: Result<WsEventMessage, RecvError>) -> ControlFlow<()> {
        match update {
            Ok(message) => {
                let Some(frame) = encode_frame(&message) else {
                    return ControlFlow::Continue(());
                };
                if self.session.text(frame).await.is_err() {
                    warn!(client = %self.peer, "Failed to push run update, dropping client");
                    return ControlFlow::Break(());
                }
            }
            Err(RecvError::Lagged(missed)) => {
                // The client's next full refresh picks up the skipped runs
                warn!(client = %self.peer, missed, "Client fell behind on run updates");
            }
            Err(RecvError::Closed) => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    async fn on_tick(&mut self) -> ControlFlow<()> {
        if self.last_pong.elapsed() > PING_INTERVAL + PONG_TIMEOUT {
            warn!(client = %self.peer, "No pong received, dropping client");
            return ControlFlow::Break(());
        }
        if self.session.ping(b"").await.is_err() {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

fn encode_frame(message: &WsEventMessage) -> Option<String> {
    serde_json::to_string(message)
        .map_err(|e| warn!(error = %e, "Failed to encode run update"))
        .ok()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(websocket_handler)));
}
