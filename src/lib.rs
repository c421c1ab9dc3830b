//! # wsrelay
//!
//! `wsrelay` is a single-process, in-memory WebSocket relay. Connections on
//! one port announce themselves as publishers or subscribers, and every
//! message a publisher sends is fanned out to all connected subscribers,
//! as JSON text or opaque binary, without any envelope.
//!
//! ## Core Modules
//!
//! - `relay`: connection registry, handshake classification and the broadcast engine.
//! - `transport`: the listening socket, HTTP health checks and per-connection lifecycle.
//! - `client`: publisher and subscriber helpers for programs that use the relay.
//! - `config`: loading and merging server configuration.
//! - `utils`: the error type and logging setup.

pub mod client;
pub mod config;
pub mod relay;
pub mod transport;
pub mod utils;
