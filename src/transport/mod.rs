//! The `transport` module owns the network side of the relay.
//!
//! One TCP port serves two kinds of traffic: plain HTTP requests, answered
//! directly for health checks, and WebSocket upgrades, which become relay
//! connections. `server` is the axum router and listener; `websocket` runs
//! each upgraded connection's lifecycle.

pub mod server;
pub mod websocket;

pub use server::{HEALTH_BODY, RelayServer, RelayState, router};
pub use websocket::{Connection, supervise};
