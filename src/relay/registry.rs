use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::relay::message::RelayMessage;

/// Identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Role of a connection, decided once by the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unclassified,
    Publisher,
    Subscriber,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Unclassified => "unclassified",
            Role::Publisher => "publisher",
            Role::Subscriber => "subscriber",
        };
        f.write_str(name)
    }
}

/// Descriptive attributes of a connection, shared with the registry.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub remote_addr: String,
    pub created_at: DateTime<Utc>,
}

impl ConnectionInfo {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            remote_addr: remote_addr.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A subscriber as seen by the broadcast engine: its identity and the
/// sending half of its outbound queue.
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    pub info: ConnectionInfo,
    pub outbox: mpsc::Sender<RelayMessage>,
}

#[derive(Debug, Default)]
struct Members {
    publishers: HashMap<ConnectionId, ConnectionInfo>,
    subscribers: HashMap<ConnectionId, SubscriberHandle>,
}

/// Membership sets for publishers and subscribers.
///
/// The registry never owns a connection; it only records membership. All
/// mutation goes through one mutex, and each operation touches the maps
/// exactly once, so no caller can observe a half-inserted connection.
#[derive(Debug, Default)]
pub struct Registry {
    members: Mutex<Members>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn members(&self) -> MutexGuard<'_, Members> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a publisher and returns the guard that releases it.
    ///
    /// Ids are fresh per connection and each connection is classified once,
    /// so a connection only ever lands in one set.
    pub fn add_publisher(self: &Arc<Self>, info: ConnectionInfo) -> Registration {
        let id = info.id;
        self.members().publishers.insert(id, info);
        Registration::new(self.clone(), id, Role::Publisher)
    }

    /// Adds a subscriber with its outbound queue and returns the guard that releases it.
    pub fn add_subscriber(
        self: &Arc<Self>,
        info: ConnectionInfo,
        outbox: mpsc::Sender<RelayMessage>,
    ) -> Registration {
        let id = info.id;
        self.members()
            .subscribers
            .insert(id, SubscriberHandle { info, outbox });
        Registration::new(self.clone(), id, Role::Subscriber)
    }

    /// Removes `id` from whichever set holds it.
    ///
    /// Returns the role it was registered under, or `None` if it was not a
    /// member. Only the first of several concurrent calls observes `Some`.
    pub fn release(&self, id: &ConnectionId) -> Option<Role> {
        let mut members = self.members();
        if members.publishers.remove(id).is_some() {
            Some(Role::Publisher)
        } else if members.subscribers.remove(id).is_some() {
            Some(Role::Subscriber)
        } else {
            None
        }
    }

    /// Point-in-time copy of the subscriber set.
    pub fn subscribers(&self) -> Vec<SubscriberHandle> {
        self.members().subscribers.values().cloned().collect()
    }

    pub fn role_of(&self, id: &ConnectionId) -> Option<Role> {
        let members = self.members();
        if members.publishers.contains_key(id) {
            Some(Role::Publisher)
        } else if members.subscribers.contains_key(id) {
            Some(Role::Subscriber)
        } else {
            None
        }
    }

    pub fn publisher_count(&self) -> usize {
        self.members().publishers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.members().subscribers.len()
    }
}

/// Membership held by a connection task.
///
/// Dropping it removes the connection from the registry, so the
/// connection leaves the registry however its task ends.
#[derive(Debug)]
pub struct Registration {
    registry: Arc<Registry>,
    id: ConnectionId,
    role: Role,
}

impl Registration {
    fn new(registry: Arc<Registry>, id: ConnectionId, role: Role) -> Self {
        Self { registry, id, role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Releases now and reports whether this call removed the entry.
    pub fn release(self) -> bool {
        // Drop runs release again and finds nothing.
        self.registry.release(&self.id).is_some()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(role) = self.registry.release(&self.id) {
            tracing::debug!(conn = %self.id, %role, "released from registry");
        }
    }
}
