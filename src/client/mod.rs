//! The `client` module is the other end of the relay.
//!
//! Producers use [`RelayPublisher`] to announce themselves and publish JSON
//! documents or raw bytes; consumers call [`subscribe`] and read whatever
//! publishers send, exactly as they sent it.

pub mod pubsub_client;
pub use pubsub_client::{RelayPublisher, RelaySubscription, subscribe};

#[cfg(test)]
mod tests;
