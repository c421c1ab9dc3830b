use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tungstenite::protocol::Message as WsMessage;
use url::Url;

use crate::relay::RelayMessage;
use crate::relay::handshake::SENDER_FIELD;
use crate::utils::error::{RelayError, Result};

type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The first message a connection sends to announce its role.
pub fn handshake(sender: bool) -> WsMessage {
    WsMessage::text(json!({ SENDER_FIELD: sender }).to_string())
}

fn outgoing(msg: RelayMessage) -> WsMessage {
    match msg {
        RelayMessage::Text(text) => WsMessage::text(text.as_str().to_owned()),
        RelayMessage::Binary(data) => WsMessage::Binary(data),
    }
}

async fn open(url: &str) -> Result<ClientStream> {
    let url = Url::parse(url).map_err(|e| RelayError::InvalidUrl(format!("{url}: {e}")))?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(RelayError::InvalidUrl(format!("unsupported scheme {other}"))),
    }
    let (ws, _response) = connect_async(url.as_str()).await?;
    Ok(ws)
}

/// A connection that has announced itself as a publisher.
#[derive(Debug)]
pub struct RelayPublisher {
    ws: ClientStream,
}

impl RelayPublisher {
    /// Connects to the relay at `url` and sends the publisher handshake.
    pub async fn connect(url: &str) -> Result<Self> {
        let mut ws = open(url).await?;
        ws.send(handshake(true)).await?;
        Ok(Self { ws })
    }

    pub async fn publish(&mut self, msg: RelayMessage) -> Result<()> {
        self.ws.send(outgoing(msg)).await?;
        Ok(())
    }

    pub async fn publish_json(&mut self, value: &Value) -> Result<()> {
        self.publish(RelayMessage::json(value)?).await
    }

    pub async fn publish_bytes(&mut self, data: impl Into<Bytes>) -> Result<()> {
        self.publish(RelayMessage::Binary(data.into())).await
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// A connection registered as a subscriber.
#[derive(Debug)]
pub struct RelaySubscription {
    ws: ClientStream,
}

/// Connects to the relay at `url` as a subscriber.
///
/// Sends `{"sender": false}` right away so the relay does not have to wait
/// out its handshake timeout before registering the connection.
pub async fn subscribe(url: &str) -> Result<RelaySubscription> {
    let mut ws = open(url).await?;
    ws.send(handshake(false)).await?;
    Ok(RelaySubscription { ws })
}

impl RelaySubscription {
    /// Next relayed message, or `None` once the relay closes the connection.
    pub async fn next(&mut self) -> Option<Result<RelayMessage>> {
        while let Some(frame) = self.ws.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    return Some(Ok(RelayMessage::Text(text.as_str().into())));
                }
                Ok(WsMessage::Binary(data)) => return Some(Ok(RelayMessage::Binary(data))),
                Ok(WsMessage::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
