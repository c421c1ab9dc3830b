use bytes::Bytes;
use serde_json::Value;
use axum::extract::ws::{Message as WsMessage, Utf8Bytes};

/// A message relayed from a publisher to subscribers.
///
/// `Text` always carries a JSON document exactly as the publisher sent it.
/// Anything else travels as `Binary`, unparsed. Both variants are cheap to
/// clone, which the broadcast engine relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Text(Utf8Bytes),
    Binary(Bytes),
}

impl RelayMessage {
    pub fn len(&self) -> usize {
        match self {
            RelayMessage::Text(text) => text.len(),
            RelayMessage::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::Text(_) => "json",
            RelayMessage::Binary(_) => "binary",
        }
    }

    /// Serializes `value` into a `Text` message.
    pub fn json(value: &Value) -> serde_json::Result<Self> {
        Ok(RelayMessage::Text(serde_json::to_string(value)?.into()))
    }
}

impl From<RelayMessage> for WsMessage {
    fn from(msg: RelayMessage) -> Self {
        match msg {
            RelayMessage::Text(text) => WsMessage::Text(text),
            RelayMessage::Binary(data) => WsMessage::Binary(data),
        }
    }
}

/// What an inbound frame turned out to be once its content was examined.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A text frame holding valid JSON. `raw` is the text as received.
    Structured { value: Value, raw: Utf8Bytes },
    /// A text frame that is not JSON.
    MalformedText(Utf8Bytes),
    /// A binary frame.
    Raw(Bytes),
    /// Ping or pong; carries no application data.
    Control,
    /// The peer's close frame.
    Close,
}

impl Inbound {
    pub fn parse(msg: WsMessage) -> Self {
        match msg {
            WsMessage::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => Inbound::Structured { value, raw: text },
                Err(_) => Inbound::MalformedText(text),
            },
            WsMessage::Binary(data) => Inbound::Raw(data),
            WsMessage::Ping(_) | WsMessage::Pong(_) => Inbound::Control,
            WsMessage::Close(_) => Inbound::Close,
        }
    }

    /// The message a publisher's frame becomes on the way to subscribers.
    ///
    /// JSON is forwarded verbatim as text; non-JSON text and binary frames
    /// are forwarded as binary.
    pub fn into_relay(self) -> Option<RelayMessage> {
        match self {
            Inbound::Structured { raw, .. } => Some(RelayMessage::Text(raw)),
            Inbound::MalformedText(text) => Some(RelayMessage::Binary(Bytes::copy_from_slice(
                text.as_bytes(),
            ))),
            Inbound::Raw(data) => Some(RelayMessage::Binary(data)),
            Inbound::Control | Inbound::Close => None,
        }
    }
}
