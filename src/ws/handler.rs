//! WebSocket upgrade handler and the per-connection reader/writer tasks.
//!
//! Each connection gets exactly one reader and one writer; nothing else
//! touches the socket. The reader decodes intents and applies them to the
//! world under its mutex. The writer drains the bounded egress queue, batching
//! everything currently queued into a single text frame.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::send_to;
use crate::hub::{ConnHandle, ConnId};
use crate::util::rate_limit::ConnRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Largest inbound frame we accept
const MAX_MESSAGE_SIZE: usize = 512;
/// Reader gives up if nothing (not even a pong) arrives for this long
const READ_TIMEOUT: Duration = Duration::from_secs(60);
/// Writer abandons a send that does not complete in this long
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Keep-alive pings, paced to beat the read deadline
const PING_PERIOD: Duration = Duration::from_secs(READ_TIMEOUT.as_secs() * 9 / 10);

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = state.hub.next_conn_id();
    info!(conn_id, "new connection");

    let (ws_sink, ws_stream) = socket.split();
    let (conn, egress_rx) = ConnHandle::new(conn_id);

    state.hub.register(conn.clone()).await;

    let writer = tokio::spawn(write_pump(conn_id, ws_sink, egress_rx, conn.clone()));

    let player_id = read_pump(conn_id, ws_stream, conn, &state).await;

    // Reader is done: unregister (closes the egress side, idempotent if the
    // hub already evicted us) and take the avatar out of the world.
    state.hub.unregister(conn_id).await;
    if let Some(player_id) = player_id {
        let mut world = state.world.lock().await;
        if world.remove_player(player_id).is_some() {
            info!(conn_id, player_id, "player disconnected");
        }
    }

    let _ = writer.await;
    info!(conn_id, "connection closed");
}

/// Reader task body: decode inbound intents until the socket dies or goes
/// silent past the deadline. Returns the attached player id, if any.
async fn read_pump(
    conn_id: ConnId,
    mut stream: SplitStream<WebSocket>,
    conn: ConnHandle,
    state: &AppState,
) -> Option<u32> {
    let rate_limiter = ConnRateLimiter::new();
    let mut player_id: Option<u32> = None;

    loop {
        // Any inbound frame refreshes the deadline, including the pongs our
        // keep-alive pings elicit from an otherwise idle viewer.
        let message = match timeout(READ_TIMEOUT, stream.next()).await {
            Err(_) => {
                debug!(conn_id, "read deadline expired");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!(conn_id, error = %e, "websocket read error");
                break;
            }
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => {
                if !rate_limiter.check_input() {
                    warn!(conn_id, "rate limited inbound message");
                    continue;
                }
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => handle_client_msg(conn_id, msg, &conn, state, &mut player_id).await,
                    Err(e) => {
                        warn!(conn_id, error = %e, "dropping unparseable message");
                    }
                }
            }
            Message::Binary(_) => {
                warn!(conn_id, "binary frame ignored");
            }
            // Protocol-level replies are handled by axum; reaching here is
            // enough to refresh the read deadline.
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                debug!(conn_id, "client initiated close");
                break;
            }
        }
    }

    player_id
}

/// Apply one decoded intent
async fn handle_client_msg(
    conn_id: ConnId,
    msg: ClientMsg,
    conn: &ConnHandle,
    state: &AppState,
    player_id: &mut Option<u32>,
) {
    match msg {
        ClientMsg::Join => {
            let mut world = state.world.lock().await;
            // A stale id from an avatar that has since died does not count
            // as attached; the connection may join again.
            let attached = player_id.is_some_and(|id| world.player(id).is_some());
            if attached {
                debug!(conn_id, "join ignored, player already attached");
                return;
            }
            let id = world.add_player(Some(conn.clone()));
            drop(world);
            *player_id = Some(id);
            send_to(conn, &ServerMsg::Joined { player_id: id });
        }
        ClientMsg::Direction { direction } => {
            if let Some(id) = *player_id {
                let mut world = state.world.lock().await;
                if !world.set_direction(id, direction) {
                    // Avatar died; detach so a later join can re-create it.
                    *player_id = None;
                }
            }
        }
    }
}

/// Writer task body: drain the egress queue onto the socket, batching all
/// queued messages into one frame, and pace keep-alive pings.
async fn write_pump(
    conn_id: ConnId,
    mut sink: SplitSink<WebSocket, Message>,
    mut egress_rx: mpsc::Receiver<String>,
    conn: ConnHandle,
) {
    let mut ping = interval(PING_PERIOD);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping.tick().await; // the first tick fires immediately

    loop {
        tokio::select! {
            received = egress_rx.recv() => match received {
                Some(first) => {
                    // Amortize framing: everything queued right now goes out
                    // in the same text frame, newline separated.
                    let mut payload = first;
                    while let Ok(next) = egress_rx.try_recv() {
                        payload.push('\n');
                        payload.push_str(&next);
                    }
                    match timeout(WRITE_TIMEOUT, sink.send(Message::Text(payload))).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            debug!(conn_id, error = %e, "websocket write error");
                            break;
                        }
                        Err(_) => {
                            debug!(conn_id, "write deadline expired");
                            break;
                        }
                    }
                }
                None => {
                    let _ = timeout(WRITE_TIMEOUT, sink.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = conn.closed() => {
                // Evicted or unregistered; queued messages are abandoned.
                let _ = timeout(WRITE_TIMEOUT, sink.send(Message::Close(None))).await;
                break;
            }
            _ = ping.tick() => {
                if timeout(WRITE_TIMEOUT, sink.send(Message::Ping(Vec::new())))
                    .await
                    .map_or(true, |r| r.is_err())
                {
                    debug!(conn_id, "keep-alive ping failed");
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}
