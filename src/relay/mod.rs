//! The relay core: who is connected, what they are, and how a publisher's
//! message reaches every subscriber.
//!
//! - `registry`: membership sets for publishers and subscribers.
//! - `message`: the relayed message type and inbound frame parsing.
//! - `handshake`: first-message role classification.
//! - `engine`: the broadcast fan-out.

pub mod engine;
pub mod handshake;
pub mod message;
pub mod registry;

pub use engine::{BroadcastReport, Broadcaster};
pub use handshake::{Outcome, RejectReason};
pub use message::{Inbound, RelayMessage};
pub use registry::{ConnectionId, ConnectionInfo, Registration, Registry, Role};
