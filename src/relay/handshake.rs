//! Role classification for freshly upgraded connections.
//!
//! A connection announces itself with its first message. A JSON object
//! carrying `"sender": true` makes it a publisher. Silence or any other
//! first message makes it a subscriber. A connection is only turned away
//! when the transport reports an error or the peer leaves first.

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::Message as WsMessage;
use futures_util::{Stream, StreamExt};
use tokio::time::{Instant, timeout_at};

use crate::relay::message::{Inbound, RelayMessage};

/// Field of the first message that marks a publisher.
pub const SENDER_FIELD: &str = "sender";

/// What the connection produced while the handshake was pending.
#[derive(Debug)]
pub enum HandshakeFrame {
    Message(Inbound),
    TimedOut,
    Closed,
    Violation(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The transport failed to read a frame, e.g. a protocol violation.
    ProtocolViolation(String),
    /// The peer went away before saying anything.
    Closed,
}

/// Classification of a connection. Decided once, never revised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `first` is the handshake message itself.
    Publisher { first: RelayMessage },
    Subscriber,
    Rejected(RejectReason),
}

/// Decides the role for what the connection sent first.
pub fn classify(frame: HandshakeFrame) -> Outcome {
    match frame {
        HandshakeFrame::Message(Inbound::Structured { value, raw }) => {
            let is_sender = value
                .get(SENDER_FIELD)
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if is_sender {
                Outcome::Publisher {
                    first: RelayMessage::Text(raw),
                }
            } else {
                Outcome::Subscriber
            }
        }
        HandshakeFrame::Message(Inbound::Close) | HandshakeFrame::Closed => {
            Outcome::Rejected(RejectReason::Closed)
        }
        HandshakeFrame::Message(_) | HandshakeFrame::TimedOut => Outcome::Subscriber,
        HandshakeFrame::Violation(reason) => {
            Outcome::Rejected(RejectReason::ProtocolViolation(reason))
        }
    }
}

/// Waits up to `wait` for the first data message on `stream`.
///
/// Control frames do not count as the handshake and do not extend the
/// deadline. A read error ends the wait as a violation.
pub async fn await_handshake<S, E>(stream: &mut S, wait: Duration) -> HandshakeFrame
where
    S: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    let deadline = Instant::now() + wait;
    loop {
        match timeout_at(deadline, stream.next()).await {
            Err(_) => return HandshakeFrame::TimedOut,
            Ok(None) => return HandshakeFrame::Closed,
            Ok(Some(Err(err))) => return HandshakeFrame::Violation(err.to_string()),
            Ok(Some(Ok(msg))) => match Inbound::parse(msg) {
                Inbound::Control => continue,
                inbound => return HandshakeFrame::Message(inbound),
            },
        }
    }
}
