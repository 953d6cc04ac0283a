//! Per-connection handler: welcome, outbox writer and inbound routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   0. Complete the WebSocket upgrade within the idle timeout
//!   1. Queue `Welcome` and register the outbox with the master
//!   2. Spawn a writer that frames outbox messages onto the socket
//!   3. Loop: receive envelopes → answer heartbeats, forward signals
//!   4. On exit, the guard tells the master the client disconnected

use std::sync::Arc;
use std::time::Instant;

use dropfour_lobby::{MasterHandle, Signal};
use dropfour_protocol::{
    ClientId, ClientMessage, Codec, Envelope, RejectReason, ServerMessage,
};
use dropfour_transport::{Connection, Handshake, PendingWebSocket, WebSocketConnection};
use tokio::sync::mpsc;

use crate::DropfourError;
use crate::server::ServerState;

/// Drop guard that reports a disconnect when the handler exits.
///
/// Runs on every exit path, including errors and panics. `Drop` is
/// synchronous, so the signal is sent from a spawned task.
struct DisconnectGuard {
    client: ClientId,
    master: MasterHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let client = self.client;
        let master = self.master.clone();
        tokio::spawn(async move {
            let _ = master.signal(client, Signal::Disconnect).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    pending: PendingWebSocket,
    state: Arc<ServerState>,
) -> Result<(), DropfourError> {
    let client = ClientId::from(pending.id());
    let peer = pending.peer_addr();

    // Dropping the pending upgrade on timeout closes the socket.
    let conn = tokio::time::timeout(state.idle_timeout, pending.upgrade())
        .await
        .map_err(|_| DropfourError::HandshakeTimeout(peer))??;

    let start = Instant::now();
    tracing::info!(%client, %peer, "client connected");

    let (tx, rx) = mpsc::unbounded_channel();
    let _ = tx.send(ServerMessage::Welcome {
        client_id: client,
        server_time: elapsed_ms(&start),
    });
    state.master.connect(client, tx.clone()).await?;
    let guard = DisconnectGuard {
        client,
        master: state.master.clone(),
    };

    let conn = Arc::new(conn);
    let writer = tokio::spawn(write_outbox(
        Arc::clone(&conn),
        Arc::clone(&state),
        rx,
        start,
    ));

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%client, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%client, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%client, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let envelope: Envelope<ClientMessage> = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%client, error = %e, "failed to decode envelope");
                let _ = tx.send(ServerMessage::Rejected {
                    reason: RejectReason::Malformed,
                    message: e.to_string(),
                });
                continue;
            }
        };

        match envelope.payload {
            ClientMessage::Heartbeat { client_time } => {
                let _ = tx.send(ServerMessage::HeartbeatAck {
                    client_time,
                    server_time: elapsed_ms(&start),
                });
            }
            msg => {
                if let Some(signal) = Signal::from_client_message(&msg) {
                    state.master.signal(client, signal).await?;
                }
            }
        }
    }

    // The writer drains whatever is already queued, then stops once the
    // master drops its copy of the outbox after the disconnect.
    drop(tx);
    drop(guard);
    let _ = writer.await;
    Ok(())
}

/// Frames outbox messages as envelopes and writes them to the socket.
async fn write_outbox(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    start: Instant,
) {
    let client = ClientId::from(conn.id());
    let mut seq: u64 = 0;

    while let Some(payload) = rx.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: elapsed_ms(&start),
            payload,
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%client, error = %e, "failed to encode notification");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%client, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

fn elapsed_ms(start: &Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
