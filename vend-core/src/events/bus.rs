//! Push event bus and driver command channel.

use tokio::sync::{broadcast, mpsc};
use tracing::trace;

use super::types::{DriverCommand, PushEvent};

/// Default capacity of the push event bus.
///
/// Subscribers that fall further behind than this lose the oldest events.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Default buffer size for the driver command channel.
pub const DEFAULT_COMMAND_BUFFER: usize = 16;

/// Sender handle for DriverCommand events.
pub type DriverCommandSender = mpsc::Sender<DriverCommand>;
/// Receiver handle for DriverCommand events.
pub type DriverCommandReceiver = mpsc::Receiver<DriverCommand>;

/// Create a new DriverCommand channel.
pub fn driver_command_channel() -> (DriverCommandSender, DriverCommandReceiver) {
    mpsc::channel(DEFAULT_COMMAND_BUFFER)
}

/// Publish/subscribe hub for [`PushEvent`]s.
///
/// Every subscriber sees every event published after it subscribed, in
/// publication order.
#[derive(Clone)]
pub struct PushEventBus {
    tx: broadcast::Sender<PushEvent>,
}

impl PushEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }

    /// Publish `event` to all current subscribers.
    ///
    /// Returns how many subscribers will see it; publishing with nobody
    /// listening is not an error.
    pub fn publish(&self, event: PushEvent) -> usize {
        trace!(?event, "publishing push event");
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for PushEventBus {
    fn default() -> Self {
        Self::new()
    }
}
