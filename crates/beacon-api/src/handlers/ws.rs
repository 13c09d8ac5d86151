//! WebSocket upgrade handler.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use beacon_realtime::{BroadcastSession, ClientId, ConnectionId, ConnectionRegistry, Frame};

use crate::error::ApiError;
use crate::state::AppState;

/// How long queued frames may take to drain after the session ends.
const OUTBOUND_FLUSH: Duration = Duration::from_secs(2);

/// GET /ws/{client_id}: WebSocket upgrade
///
/// The connection is registered before upgrading so a full registry is
/// answered with 503 instead of an upgraded socket that closes at once.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let (session, outbound) = state.realtime.open_session(ClientId::new(client_id)).await?;
    let registry = state.realtime.registry.clone();
    let conn_id = session.handle().id;

    Ok(ws
        .on_failed_upgrade(move |e| {
            warn!(conn_id = %conn_id, error = %e, "WebSocket upgrade failed");
            discard_failed_upgrade(registry, conn_id);
        })
        .on_upgrade(move |socket| handle_ws_connection(session, outbound, socket)))
}

/// Unregisters a connection whose upgrade never completed.
fn discard_failed_upgrade(
    registry: Arc<ConnectionRegistry>,
    conn_id: ConnectionId,
) -> JoinHandle<bool> {
    tokio::spawn(async move { registry.unregister(&conn_id).await })
}

/// Drives an established WebSocket connection until it closes.
async fn handle_ws_connection(
    session: BroadcastSession,
    mut outbound_rx: mpsc::Receiver<String>,
    socket: WebSocket,
) {
    let (mut ws_tx, ws_rx) = socket.split();
    let conn_id = session.handle().id;
    let client_id = session.handle().client_id;

    info!(conn_id = %conn_id, client_id = %client_id, "WebSocket connection established");

    // Spawn outbound message forwarder
    let mut outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let inbound = ws_rx.map(|result| result.map(to_frame));
    let summary = session.run(inbound).await;

    // The queue closes once the session has released its handle
    if tokio::time::timeout(OUTBOUND_FLUSH, &mut outbound_task)
        .await
        .is_err()
    {
        outbound_task.abort();
    }

    debug!(
        conn_id = %conn_id,
        client_id = %client_id,
        reason = %summary.reason,
        messages = summary.messages_handled,
        "WebSocket connection finished"
    );
}

fn to_frame(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.as_str().to_owned()),
        Message::Close(_) => Frame::Close,
        _ => Frame::Other,
    }
}
