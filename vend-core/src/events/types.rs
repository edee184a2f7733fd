//! Event type definitions.

use vend_sdk::objects::push::ServerEvent;

use crate::state::ConnectionState;

/// Transitions of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connecting,
    Connected,
    ConnectError,
    ConnectTimeout,
    Disconnected,
}

impl From<ConnectionEvent> for ConnectionState {
    fn from(event: ConnectionEvent) -> Self {
        match event {
            ConnectionEvent::Connecting => ConnectionState::Connecting,
            ConnectionEvent::Connected => ConnectionState::Connected,
            ConnectionEvent::ConnectError => ConnectionState::Error,
            ConnectionEvent::ConnectTimeout => ConnectionState::Timeout,
            ConnectionEvent::Disconnected => ConnectionState::Disconnected,
        }
    }
}

/// Everything published on the push event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connection(ConnectionEvent),
    Server(ServerEvent),
    /// A known event arrived with an unusable payload.
    Malformed { event: &'static str },
}

/// Requests from the listener to the connection driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// Send a status snapshot request.
    RequestSnapshot,
    /// Drop the current connection and connect again right away.
    Reconnect,
}
