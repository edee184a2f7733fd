//! EventListener processor.
//!
//! The EventListener is responsible for:
//! - Mirroring push connection transitions into the status line
//! - Requesting a status snapshot whenever the connection comes up
//! - Applying `status` snapshots to the client state
//! - Turning error, vend outcome and malformed events into banners
//! - Resetting all client state when the server asks for a refresh

use std::convert::Infallible;

use kanau::processor::Processor;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use vend_sdk::objects::push::ServerEvent;

use super::shutdown_requested;
use crate::events::{ConnectionEvent, DriverCommand, DriverCommandSender, PushEvent};
use crate::state::{Banners, ClientState, ConnectionState, StateStore};

/// Banner shown when a vend completes.
pub const VEND_COMPLETED: &str = "Vend Completed";

pub struct EventListener {
    store: StateStore<ClientState>,
    banners: Banners,
    commands: DriverCommandSender,
}

impl EventListener {
    pub fn new(store: StateStore<ClientState>, banners: Banners, commands: DriverCommandSender) -> Self {
        Self {
            store,
            banners,
            commands,
        }
    }

    /// Run the EventListener until shutdown is signaled or the bus closes.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut events: broadcast::Receiver<PushEvent>,
    ) {
        info!("EventListener started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!("EventListener received shutdown signal");
                    break;
                }

                result = events.recv() => match result {
                    Ok(event) => {
                        let _ = self.process(event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "EventListener lagged behind the push event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Push event bus closed");
                        break;
                    }
                },
            }
        }

        info!("EventListener shutdown complete");
    }

    async fn on_connection(&self, event: ConnectionEvent) {
        let connection = ConnectionState::from(event);
        info!(?connection, "push connection state changed");
        self.store
            .modify(|state| state.set_connection(connection))
            .await;

        match event {
            ConnectionEvent::Connected => {
                self.command(DriverCommand::RequestSnapshot).await;
            }
            ConnectionEvent::Disconnected => {
                self.banners.info(connection.status_text()).await;
            }
            _ => {}
        }
    }

    async fn on_server_event(&self, event: ServerEvent) {
        match event {
            ServerEvent::Status(snapshot) => {
                debug!(code = ?snapshot.status.code, text = %snapshot.status.text, "status update");
                self.store
                    .modify(|state| state.set_status(&snapshot.status))
                    .await;
            }
            ServerEvent::Error(error) => {
                warn!(code = error.code, message = %error.message, "server error");
                self.banners.error(error.message).await;
            }
            ServerEvent::VendError(error) => {
                warn!(code = error.code, msg = %error.msg, "vend failed");
                self.banners.error(error.msg).await;
            }
            ServerEvent::VendSuccess => {
                info!("vend completed");
                self.banners.success(VEND_COMPLETED).await;
            }
            ServerEvent::Heartbeat(payload) => {
                debug!(%payload, "heartbeat");
            }
            ServerEvent::Refresh => {
                info!("server requested refresh, resetting client state");
                self.reload().await;
            }
            ServerEvent::Shutdown => {
                info!("server is shutting down");
                self.banners.info("Server shutting down").await;
            }
        }
    }

    /// Start over: every piece of client state goes back to its initial
    /// value and the push connection is re-established.
    async fn reload(&self) {
        self.banners.cancel_timers();
        self.store
            .modify(ClientState::reset)
            .await;
        self.command(DriverCommand::Reconnect).await;
    }

    async fn command(&self, command: DriverCommand) {
        if let Err(e) = self.commands.send(command).await {
            warn!(?command, error = %e, "connection driver is gone");
        }
    }
}

impl Processor<PushEvent> for EventListener {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, event: PushEvent) -> Result<(), Infallible> {
        match event {
            PushEvent::Connection(event) => self.on_connection(event).await,
            PushEvent::Server(event) => self.on_server_event(event).await,
            PushEvent::Malformed { event } => {
                warn!(event, "discarding malformed push event");
                self.banners.error(format!("Bad {event} response")).await;
            }
        }
        Ok(())
    }
}
