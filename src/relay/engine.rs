use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::relay::message::RelayMessage;
use crate::relay::registry::{Registry, SubscriberHandle};

/// Result of delivering one message to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The subscriber's queue is gone; its connection is shutting down.
    Closed,
    /// The subscriber's queue is full. The message is dropped for this
    /// subscriber only.
    Full,
}

/// Counts for one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Fans publisher messages out to every registered subscriber.
///
/// Each delivery is an independent, non-blocking enqueue onto the
/// subscriber's bounded outbound queue; the subscriber's own task performs
/// the socket write under its write timeout. A slow or failing subscriber
/// only shows up in the report and never holds up the publisher.
#[derive(Debug)]
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Delivers `msg` to every subscriber registered at call time.
    ///
    /// Subscribers that join after the snapshot is taken do not receive it.
    pub fn broadcast(&self, msg: RelayMessage) -> BroadcastReport {
        let recipients = self.registry.subscribers();
        if recipients.is_empty() {
            debug!(kind = msg.kind(), bytes = msg.len(), "no subscribers, dropping message");
            return BroadcastReport::default();
        }

        let mut report = BroadcastReport {
            attempted: recipients.len(),
            ..BroadcastReport::default()
        };
        for subscriber in &recipients {
            match deliver(subscriber, msg.clone()) {
                Delivery::Delivered => report.delivered += 1,
                failure => {
                    report.failed += 1;
                    warn!(
                        conn = %subscriber.info.id,
                        peer = %subscriber.info.remote_addr,
                        ?failure,
                        "delivery failed"
                    );
                }
            }
        }

        debug!(
            kind = msg.kind(),
            bytes = msg.len(),
            delivered = report.delivered,
            failed = report.failed,
            "broadcast complete"
        );
        report
    }
}

fn deliver(subscriber: &SubscriberHandle, msg: RelayMessage) -> Delivery {
    match subscriber.outbox.try_send(msg) {
        Ok(()) => Delivery::Delivered,
        Err(TrySendError::Closed(_)) => Delivery::Closed,
        Err(TrySendError::Full(_)) => Delivery::Full,
    }
}
