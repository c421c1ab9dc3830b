//! HTTP side of the relay.
//!
//! Every request on the listening port lands in one fallback handler:
//! - a valid WebSocket upgrade becomes a relay connection
//! - a broken upgrade attempt gets axum's rejection (400 and friends)
//! - plain `GET`/`HEAD` are health checks, anything else is 405

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::RelaySettings;
use crate::relay::{Broadcaster, ConnectionInfo, Registry};
use crate::transport::websocket::{Connection, supervise};
use crate::utils::error::Result;

/// Body of the health-check response.
pub const HEALTH_BODY: &str = "WebSocket server is running";

/// Methods answered without an upgrade.
const ALLOWED_METHODS: &str = "GET, HEAD";

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct RelayState {
    broadcaster: Arc<Broadcaster>,
    settings: Arc<RelaySettings>,
}

impl RelayState {
    pub fn new(settings: RelaySettings) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            broadcaster: Arc::new(Broadcaster::new(registry)),
            settings: Arc::new(settings),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.broadcaster.registry()
    }
}

/// Builds the relay's router. Every path is served by the same handler.
pub fn router(state: RelayState) -> Router {
    Router::new().fallback(relay_handler).with_state(state)
}

/// The relay's listening socket and the state its connections share.
#[derive(Debug)]
pub struct RelayServer {
    listener: TcpListener,
    state: RelayState,
}

impl RelayServer {
    pub async fn bind(addr: &str, settings: RelaySettings) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, settings))
    }

    pub fn from_listener(listener: TcpListener, settings: RelaySettings) -> Self {
        Self {
            listener,
            state: RelayState::new(settings),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.state.registry().clone()
    }

    /// Serves connections until the task is dropped.
    pub async fn run(self) -> Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            info!("WebSocket relay listening on ws://{addr}");
        }
        let app = router(self.state).into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}

async fn relay_handler(
    State(state): State<RelayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    upgrade: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(ws) => {
            let info = ConnectionInfo::new(peer);
            info!(conn = %info.id, %peer, path = %uri.path(), "connection upgraded");
            ws.on_failed_upgrade(move |e| warn!(%peer, "failed to complete upgrade: {e}"))
                .on_upgrade(move |socket| async move {
                    let conn = Connection::new(info, socket);
                    supervise(conn, &state.broadcaster, &state.settings).await;
                })
        }
        Err(rejection) if headers.contains_key(header::UPGRADE) => {
            warn!(%peer, %method, path = %uri.path(), "bad upgrade request: {rejection}");
            rejection.into_response()
        }
        Err(_) => {
            let response = plain_response(&method);
            info!(
                %peer,
                %method,
                path = %uri.path(),
                status = response.status().as_u16(),
                "http request"
            );
            response
        }
    }
}

/// Response to a request that is not a WebSocket upgrade.
pub fn plain_response(method: &Method) -> Response {
    match *method {
        Method::GET => (StatusCode::OK, HEALTH_BODY).into_response(),
        Method::HEAD => StatusCode::OK.into_response(),
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, ALLOWED_METHODS)],
            "Method Not Allowed",
        )
            .into_response(),
    }
}
