//! End-to-end tests: real server, real WebSocket clients.

use std::time::Duration;

use dropfour::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns its address and master.
async fn start_server_with(builder: DropfourServerBuilder) -> (String, MasterHandle) {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let master = server.master();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, master)
}

async fn start_server() -> (String, MasterHandle) {
    start_server_with(DropfourServer::builder()).await
}

/// Connects and consumes the `Welcome` frame.
async fn connect(addr: &str) -> (ClientWs, ClientId) {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    match recv(&mut ws).await {
        ServerMessage::Welcome { client_id, .. } => (ws, client_id),
        other => panic!("expected Welcome, got {other:?}"),
    }
}

async fn send(ws: &mut ClientWs, seq: u64, payload: ClientMessage) {
    let envelope = Envelope {
        seq,
        timestamp: 0,
        payload,
    };
    let bytes = serde_json::to_vec(&envelope).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");
}

async fn recv_envelope(ws: &mut ClientWs) -> Envelope<ServerMessage> {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for server")
        .expect("stream ended")
        .expect("ws error");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

async fn recv(ws: &mut ClientWs) -> ServerMessage {
    recv_envelope(ws).await.payload
}

/// Two clients in a fresh match: the first is Player1.
async fn paired(addr: &str) -> (ClientWs, ClientWs) {
    let (mut a, _) = connect(addr).await;
    let (mut b, _) = connect(addr).await;

    send(&mut a, 0, ClientMessage::Ready).await;
    assert_eq!(recv(&mut a).await, ServerMessage::Queued);
    send(&mut b, 0, ClientMessage::Ready).await;

    assert!(matches!(
        recv(&mut a).await,
        ServerMessage::MatchStart { slot: Slot::Player1, .. }
    ));
    assert!(matches!(
        recv(&mut b).await,
        ServerMessage::MatchStart { slot: Slot::Player2, .. }
    ));
    (a, b)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_welcome_is_first_frame() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");

    let env = recv_envelope(&mut ws).await;
    assert_eq!(env.seq, 0);
    assert!(matches!(env.payload, ServerMessage::Welcome { .. }));
}

#[tokio::test]
async fn test_each_connection_gets_distinct_id() {
    let (addr, _) = start_server().await;
    let (_a, id_a) = connect(&addr).await;
    let (_b, id_b) = connect(&addr).await;
    assert_ne!(id_a, id_b);
}

#[tokio::test]
async fn test_heartbeat_echoes_client_time() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, 0, ClientMessage::Heartbeat { client_time: 777 }).await;
    match recv(&mut ws).await {
        ServerMessage::HeartbeatAck { client_time, .. } => {
            assert_eq!(client_time, 777);
        }
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_frame_is_rejected_and_connection_survives() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    ws.send(Message::Text("{not json".into())).await.expect("send");
    match recv(&mut ws).await {
        ServerMessage::Rejected { reason, .. } => {
            assert_eq!(reason, RejectReason::Malformed);
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    send(&mut ws, 1, ClientMessage::Ready).await;
    assert_eq!(recv(&mut ws).await, ServerMessage::Queued);
}

#[tokio::test]
async fn test_text_frames_are_accepted() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    ws.send(Message::Text(
        r#"{"seq":0,"timestamp":0,"payload":{"type":"Ready"}}"#.into(),
    ))
    .await
    .expect("send");
    assert_eq!(recv(&mut ws).await, ServerMessage::Queued);
}

#[tokio::test]
async fn test_server_seq_increases_per_connection() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, 0, ClientMessage::Heartbeat { client_time: 1 }).await;
    send(&mut ws, 1, ClientMessage::Heartbeat { client_time: 2 }).await;
    let first = recv_envelope(&mut ws).await;
    let second = recv_envelope(&mut ws).await;
    assert_eq!((first.seq, second.seq), (1, 2));
}

#[tokio::test]
async fn test_moves_are_broadcast_and_turns_enforced() {
    let (addr, _) = start_server().await;
    let (mut a, mut b) = paired(&addr).await;

    send(&mut a, 1, ClientMessage::Move { column: 3 }).await;
    let applied = ServerMessage::MoveApplied {
        slot: Slot::Player1,
        column: 3,
        row: 5,
        next_turn: Some(Slot::Player2),
    };
    assert_eq!(recv(&mut a).await, applied);
    assert_eq!(recv(&mut b).await, applied);

    send(&mut a, 2, ClientMessage::Move { column: 3 }).await;
    match recv(&mut a).await {
        ServerMessage::Rejected { reason, .. } => {
            assert_eq!(reason, RejectReason::NotYourTurn);
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    send(&mut b, 1, ClientMessage::Move { column: 9 }).await;
    match recv(&mut b).await {
        ServerMessage::Rejected { reason, .. } => {
            assert_eq!(reason, RejectReason::InvalidColumn);
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    send(&mut b, 2, ClientMessage::Move { column: 3 }).await;
    assert!(matches!(
        recv(&mut a).await,
        ServerMessage::MoveApplied { slot: Slot::Player2, row: 4, .. }
    ));
}

#[tokio::test]
async fn test_full_game_ends_with_win() {
    let (addr, _) = start_server().await;
    let (mut a, mut b) = paired(&addr).await;

    let moves = [0, 6, 1, 6, 2, 6, 3];
    for (i, column) in moves.into_iter().enumerate() {
        let mover = if i % 2 == 0 { &mut a } else { &mut b };
        send(mover, i as u64 + 1, ClientMessage::Move { column }).await;
        // Both sides see every move before the next one is sent.
        recv(&mut a).await;
        recv(&mut b).await;
    }

    let finished = ServerMessage::MatchFinished {
        result: MatchResult::Win { slot: Slot::Player1 },
    };
    assert_eq!(recv(&mut a).await, finished);
    assert_eq!(recv(&mut b).await, finished);
}

#[tokio::test]
async fn test_disconnect_mid_match_abandons() {
    let (addr, master) = start_server().await;
    let (a, mut b) = paired(&addr).await;

    drop(a);
    assert_eq!(
        recv(&mut b).await,
        ServerMessage::MatchFinished {
            result: MatchResult::Abandoned { by: Slot::Player1 },
        }
    );

    let stats = master.stats().await.expect("master running");
    assert_eq!(stats.in_match, 1);
    assert_eq!(stats.live_matches, 1);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let (addr, _) =
        start_server_with(DropfourServer::builder().idle_timeout(Duration::from_millis(100)))
            .await;
    let (mut ws, _) = connect(&addr).await;

    let next = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("server should close the idle connection");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

#[tokio::test]
async fn test_silent_tcp_peer_does_not_block_other_clients() {
    let (addr, _) = start_server().await;

    // Connects at the TCP level and never sends the upgrade request.
    let _silent = tokio::net::TcpStream::connect(&addr).await.expect("tcp connect");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (mut ws, _) = tokio::time::timeout(Duration::from_secs(3), connect(&addr))
        .await
        .expect("a later client must still be accepted");
    send(&mut ws, 0, ClientMessage::Ready).await;
    assert_eq!(recv(&mut ws).await, ServerMessage::Queued);
}

#[tokio::test]
async fn test_silent_tcp_peer_is_dropped_after_idle_timeout() {
    use tokio::io::AsyncReadExt;

    let (addr, _) =
        start_server_with(DropfourServer::builder().idle_timeout(Duration::from_millis(100)))
            .await;
    let mut silent = tokio::net::TcpStream::connect(&addr).await.expect("tcp connect");

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), silent.read(&mut buf))
        .await
        .expect("server should hang up on the silent peer");
    assert!(matches!(read, Ok(0) | Err(_)));
}
