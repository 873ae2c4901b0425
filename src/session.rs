//! Session transport: WebSocket accept loop, per-connection reader/writer
//! tasks, and shutdown.
//!
//! ## Task layout
//!
//! | Task             | Count        | Role                                   |
//! |------------------|--------------|----------------------------------------|
//! | accept loop      | 1            | TCP accept + WebSocket handshake       |
//! | reader           | 1 / session  | inbound frames → router                |
//! | writer           | 1 / session  | outbound queue → socket                |
//! | physics clock    | 1            | 50 ms tick over the player registry    |
//! | heartbeat clock  | 1            | ping / terminate cycle                 |
//!
//! A connection's panic is confined to its own tasks; the clocks and the
//! other sessions keep running.

use crate::server::Server;
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Bind the listener and serve until SIGINT.
pub async fn run(server: Arc<Server>) -> Result<()> {
    let addr = format!("0.0.0.0:{}", server.config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on ws://{}", addr);

    let physics = tokio::spawn(server.clone().run_physics());
    let heartbeat = tokio::spawn(server.clone().run_heartbeat());

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let server = server.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(server, stream, peer).await {
                                debug!("connection {} ended: {:#}", peer, e);
                            }
                        });
                    }
                    Err(e) => warn!("accept failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down (SIGINT)");
                break;
            }
        }
    }

    physics.abort();
    heartbeat.abort();

    let stats = server.stats();
    info!(
        "final stats: {} sessions, {} active zones, {} overrides, {} ticks",
        stats.connected_sessions, stats.active_zones, stats.world_overrides, stats.total_ticks
    );
    Ok(())
}

/// One connection: handshake, join, pump frames until the socket closes,
/// then tear the session down.
async fn handle_connection(server: Arc<Server>, stream: TcpStream, peer: SocketAddr) -> Result<()> {
    let ws = accept_async(stream)
        .await
        .context("websocket handshake failed")?;
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let session_id = server.join(tx);
    info!("session {} connected from {}", session_id, peer);

    // Writer: drain the outbound queue into the socket. Ends when the queue
    // closes (session torn down) or the socket rejects a write.
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if ws_tx.send(msg).await.is_err() {
                break;
            }
            if closing {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // Reader: frames from this session are handled strictly in arrival
    // order.
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => server.handle_frame(&session_id, &text),
            Ok(Message::Pong(_)) => server.note_pong(&session_id),
            Ok(Message::Ping(payload)) => {
                if let Some(handle) = server.broadcaster.handle(&session_id) {
                    handle.send_raw(Message::Pong(payload));
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary frames carry nothing in this protocol
            Err(e) => {
                debug!("read error on session {}: {}", session_id, e);
                break;
            }
        }
    }

    server.leave(&session_id);
    let _ = writer.await;
    Ok(())
}
