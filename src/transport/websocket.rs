//! WebSocket connection lifecycle
//!
//! An upgraded connection is owned by the task axum spawns for it. That task:
//! - Classifies the connection as publisher or subscriber
//! - Drives the publisher or subscriber loop
//! - Releases the connection from the registry when the loop ends
//!
//! The loops only need a stream and sink of WebSocket messages, so they run
//! the same over axum's `WebSocket` and over in-memory sockets.

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message as WsMessage, close_code};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RelaySettings;
use crate::relay::handshake::{await_handshake, classify};
use crate::relay::{
    Broadcaster, ConnectionInfo, Inbound, Outcome, RejectReason, RelayMessage, Role,
};

/// Close reason sent with a policy close. Kept well under the 123 bytes a
/// close frame allows.
const VIOLATION_REASON: &str = "protocol violation";

/// An upgraded connection, owned by the task that serves it.
#[derive(Debug)]
pub struct Connection<S> {
    info: ConnectionInfo,
    role: Role,
    closed: bool,
    socket: S,
}

impl<S, E> Connection<S>
where
    S: Stream<Item = Result<WsMessage, E>> + Sink<WsMessage, Error = E> + Unpin,
    E: Display,
{
    pub fn new(info: ConnectionInfo, socket: S) -> Self {
        Self {
            info,
            role: Role::Unclassified,
            closed: false,
            socket,
        }
    }

    async fn close(&mut self, frame: Option<CloseFrame>, wait: Duration) {
        if self.closed {
            return;
        }
        self.closed = true;
        // The peer may already be gone; nothing left to do either way.
        let _ = timeout(wait, self.socket.send(WsMessage::Close(frame))).await;
    }
}

/// Classifies `conn` and runs it in its role until it closes.
///
/// Returns the role the connection held. Whatever happens, the connection is
/// no longer in the registry when this returns, and if the task running it
/// is cancelled the dropped registration removes it.
pub async fn supervise<S, E>(
    mut conn: Connection<S>,
    broadcaster: &Broadcaster,
    settings: &RelaySettings,
) -> Role
where
    S: Stream<Item = Result<WsMessage, E>> + Sink<WsMessage, Error = E> + Unpin,
    E: Display,
{
    let registry = broadcaster.registry();
    let frame = await_handshake(&mut conn.socket, settings.handshake_timeout()).await;

    match classify(frame) {
        Outcome::Publisher { first } => {
            let registration = registry.add_publisher(conn.info.clone());
            conn.role = Role::Publisher;
            info!(conn = %conn.info.id, peer = %conn.info.remote_addr, "publisher joined");

            let first = settings.forward_handshake.then_some(first);
            run_publisher(&mut conn, first, broadcaster).await;
            conn.close(None, settings.write_timeout()).await;

            registration.release();
            info!(conn = %conn.info.id, peer = %conn.info.remote_addr, "publisher left");
        }
        Outcome::Subscriber => {
            let (outbox, inbox) = mpsc::channel(settings.subscriber_queue.max(1));
            let registration = registry.add_subscriber(conn.info.clone(), outbox);
            conn.role = Role::Subscriber;
            info!(conn = %conn.info.id, peer = %conn.info.remote_addr, "subscriber joined");

            run_subscriber(&mut conn, inbox, settings.write_timeout()).await;
            registration.release();
            conn.close(None, settings.write_timeout()).await;

            info!(conn = %conn.info.id, peer = %conn.info.remote_addr, "subscriber left");
        }
        Outcome::Rejected(RejectReason::ProtocolViolation(reason)) => {
            warn!(conn = %conn.info.id, peer = %conn.info.remote_addr, "handshake violation: {reason}");
            let frame = CloseFrame {
                code: close_code::POLICY,
                reason: VIOLATION_REASON.into(),
            };
            conn.close(Some(frame), settings.write_timeout()).await;
        }
        Outcome::Rejected(RejectReason::Closed) => {
            conn.closed = true;
            debug!(conn = %conn.info.id, "closed during handshake");
        }
    }
    conn.role
}

async fn run_publisher<S, E>(
    conn: &mut Connection<S>,
    first: Option<RelayMessage>,
    broadcaster: &Broadcaster,
) where
    S: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    if let Some(first) = first {
        broadcaster.broadcast(first);
    }

    while let Some(next) = conn.socket.next().await {
        let msg = match next {
            Ok(msg) => msg,
            Err(e) => {
                debug!(conn = %conn.info.id, "publisher receive failed: {e}");
                break;
            }
        };
        match Inbound::parse(msg) {
            Inbound::Close => break,
            inbound => {
                if let Some(relayed) = inbound.into_relay() {
                    debug!(
                        conn = %conn.info.id,
                        kind = relayed.kind(),
                        bytes = relayed.len(),
                        "broadcasting"
                    );
                    broadcaster.broadcast(relayed);
                }
            }
        }
    }
}

async fn run_subscriber<S, E>(
    conn: &mut Connection<S>,
    mut inbox: mpsc::Receiver<RelayMessage>,
    write_timeout: Duration,
) where
    S: Stream<Item = Result<WsMessage, E>> + Sink<WsMessage, Error = E> + Unpin,
    E: Display,
{
    loop {
        tokio::select! {
            inbound = conn.socket.next() => match inbound {
                // Subscribers are not expected to talk; anything but a close is ignored.
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(conn = %conn.info.id, "subscriber receive failed: {e}");
                    break;
                }
            },
            outbound = inbox.recv() => {
                let Some(msg) = outbound else { break };
                match timeout(write_timeout, conn.socket.send(WsMessage::from(msg))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        debug!(conn = %conn.info.id, "subscriber send failed: {e}");
                        break;
                    }
                    Err(_) => {
                        warn!(conn = %conn.info.id, "subscriber write timed out");
                        break;
                    }
                }
            }
        }
    }
}
