use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration settings for the relay.
///
/// Includes settings for the listening server, the relay core and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration settings for the relay core.
///
/// All durations are expressed in milliseconds.
#[derive(Debug, Deserialize, Clone)]
pub struct RelaySettings {
    /// How long a new connection has to announce itself before it is
    /// classified as a subscriber.
    pub handshake_timeout_ms: u64,
    /// Upper bound on a single socket write to a subscriber. A subscriber
    /// whose write does not finish in time is disconnected.
    pub write_timeout_ms: u64,
    /// Capacity of each subscriber's outbound queue. Messages that find the
    /// queue full are dropped for that subscriber.
    pub subscriber_queue: usize,
    /// Whether the publisher's handshake message is broadcast like any
    /// other publisher message.
    pub forward_handshake: bool,
}

impl RelaySettings {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub handshake_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    pub subscriber_queue: Option<usize>,
    pub forward_handshake: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            relay: RelaySettings::default(),
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 2000,
            write_timeout_ms: 5000,
            subscriber_queue: 64,
            forward_handshake: true,
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from `defaults`.
    pub fn merge(self, defaults: Settings) -> Settings {
        let server = self.server;
        let relay = self.relay;
        let d = defaults.relay;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(defaults.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(defaults.server.port),
            },
            relay: match relay {
                Some(r) => RelaySettings {
                    handshake_timeout_ms: r.handshake_timeout_ms.unwrap_or(d.handshake_timeout_ms),
                    write_timeout_ms: r.write_timeout_ms.unwrap_or(d.write_timeout_ms),
                    subscriber_queue: r.subscriber_queue.unwrap_or(d.subscriber_queue),
                    forward_handshake: r.forward_handshake.unwrap_or(d.forward_handshake),
                },
                None => d,
            },
            log: LogSettings {
                level: self
                    .log
                    .and_then(|l| l.level)
                    .unwrap_or(defaults.log.level),
            },
        }
    }
}
