use std::net::SocketAddr;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::monitor::{Subscriber, OUTBOUND_QUEUE_CAPACITY};
use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The remote socket address is the subscriber identity; two live
/// connections never share one.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Creates the subscriber's bounded outbound queue, delivers the
/// [`Subscriber`] to the coordinator over the join channel (the only way a
/// subscriber enters the system), then:
///   1. Spawns a forward task that drains the queue into the socket sink.
///   2. Consumes inbound frames on the current task until Close or error.
///   3. Drops the queue receiver on exit, so the coordinator's next send
///      fails and deregisters this subscriber.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let subscriber_id = addr.to_string();
    tracing::info!(subscriber = %subscriber_id, "WebSocket connected");

    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_CAPACITY);
    if state
        .joins
        .send(Subscriber::new(subscriber_id.clone(), tx))
        .await
        .is_err()
    {
        tracing::warn!(subscriber = %subscriber_id, "Coordinator gone, dropping connection");
        return;
    }

    let (mut sink, mut stream) = socket.split();

    // Forward task: drain the subscriber queue into the WebSocket sink.
    let forward_id = subscriber_id.clone();
    let forward_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(subscriber = %forward_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Inbound loop: the protocol is push-only; we only watch for Close.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(subscriber = %subscriber_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(subscriber = %subscriber_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    forward_task.abort();
    tracing::info!(subscriber = %subscriber_id, "WebSocket disconnected");
}
