//! ConnectionDriver processor.
//!
//! The ConnectionDriver is responsible for:
//! - Opening the push connection and reconnecting after it fails or drops
//! - Publishing connection transitions and decoded server events on the
//!   [`PushEventBus`]
//! - Executing [`DriverCommand`]s (snapshot requests, forced reconnects)

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use vend_sdk::client::{ClientError, Inbound, PushClient, PushSession};
use vend_sdk::objects::push::{ClientEvent, FrameError};

use super::shutdown_requested;
use crate::events::{ConnectionEvent, DriverCommand, DriverCommandReceiver, PushEvent, PushEventBus};

/// Why a session ended.
enum SessionEnd {
    Shutdown,
    /// The connection broke or the server closed it.
    Dropped,
    /// A reconnect was requested.
    Reconnect,
}

pub struct ConnectionDriver {
    client: PushClient,
    bus: PushEventBus,
    reconnect_delay: Duration,
}

impl ConnectionDriver {
    pub fn new(client: PushClient, bus: PushEventBus, reconnect_delay: Duration) -> Self {
        Self {
            client,
            bus,
            reconnect_delay,
        }
    }

    /// Keep the push connection up until shutdown is signaled.
    ///
    /// Failed attempts and dropped sessions are retried after
    /// `reconnect_delay`; a requested reconnect happens immediately.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>, mut commands: DriverCommandReceiver) {
        info!(url = %self.client.url(), "ConnectionDriver started");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            self.publish(ConnectionEvent::Connecting);
            let connected = tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown_rx) => break,
                result = self.client.connect() => result,
            };

            let reconnect_now = match connected {
                Ok(mut session) => {
                    info!("Push channel connected");
                    self.publish(ConnectionEvent::Connected);
                    match self.pump(&mut session, &mut shutdown_rx, &mut commands).await {
                        SessionEnd::Shutdown => {
                            close(session).await;
                            break;
                        }
                        SessionEnd::Reconnect => {
                            close(session).await;
                            true
                        }
                        SessionEnd::Dropped => {
                            info!("Push channel disconnected");
                            self.publish(ConnectionEvent::Disconnected);
                            false
                        }
                    }
                }
                Err(ClientError::ConnectTimeout) => {
                    warn!("Push channel connect timed out");
                    self.publish(ConnectionEvent::ConnectTimeout);
                    false
                }
                Err(e) => {
                    warn!(error = %e, "Failed to connect push channel");
                    self.publish(ConnectionEvent::ConnectError);
                    false
                }
            };

            if reconnect_now {
                continue;
            }

            tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown_rx) => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        info!("ConnectionDriver shutdown complete");
    }

    /// Relay frames and commands for one session.
    async fn pump(
        &self,
        session: &mut PushSession,
        shutdown_rx: &mut watch::Receiver<bool>,
        commands: &mut DriverCommandReceiver,
    ) -> SessionEnd {
        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(shutdown_rx) => return SessionEnd::Shutdown,

                command = commands.recv() => match command {
                    Some(DriverCommand::RequestSnapshot) => {
                        debug!("Requesting status snapshot");
                        if let Err(e) = session.send(ClientEvent::StatusRequest).await {
                            warn!(error = %e, "Failed to send status request");
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(DriverCommand::Reconnect) => {
                        info!("Reconnecting push channel on request");
                        return SessionEnd::Reconnect;
                    }
                    // Nobody is left to act on what we receive.
                    None => return SessionEnd::Shutdown,
                },

                inbound = session.next() => match inbound {
                    Ok(Some(Inbound::Event(event))) => {
                        debug!(event = event.name(), "Push event received");
                        self.bus.publish(PushEvent::Server(event));
                    }
                    Ok(Some(Inbound::Invalid(FrameError::Malformed { event, reason }))) => {
                        warn!(event, %reason, "Malformed push payload");
                        self.bus.publish(PushEvent::Malformed { event });
                    }
                    Ok(Some(Inbound::Invalid(e))) => {
                        warn!(error = %e, "Ignoring push frame");
                    }
                    Ok(None) => return SessionEnd::Dropped,
                    Err(e) => {
                        warn!(error = %e, "Push channel failed");
                        return SessionEnd::Dropped;
                    }
                },
            }
        }
    }

    fn publish(&self, event: ConnectionEvent) {
        self.bus.publish(PushEvent::Connection(event));
    }
}

async fn close(session: PushSession) {
    if let Err(e) = session.close().await {
        debug!(error = %e, "Push channel did not close cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::driver_command_channel;
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio::sync::broadcast;
    use tokio_tungstenite::tungstenite::Message;
    use url::Url;
    use vend_sdk::objects::push::ServerEvent;

    async fn next_event(rx: &mut broadcast::Receiver<PushEvent>) -> PushEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for push event")
            .unwrap()
    }

    fn driver(url: &str, bus: &PushEventBus) -> ConnectionDriver {
        let client = PushClient::new(Url::parse(url).unwrap(), Duration::from_secs(5));
        ConnectionDriver::new(client, bus.clone(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_session_relays_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let request = ws.next().await.unwrap().unwrap();
            let request: serde_json::Value =
                serde_json::from_str(request.to_text().unwrap()).unwrap();
            assert_eq!(request, serde_json::json!({"event": "status", "data": {}}));

            for frame in [
                r#"{"event":"status","data":{"status":{"code":0,"text":"Ready","creditText":"$0.00"}}}"#,
                r#"{"event":"status","data":{}}"#,
                r#"{"event":"mystery","data":{}}"#,
                r#"{"event":"vendSuccess","data":{}}"#,
            ] {
                ws.send(Message::Text(frame.to_string())).await.unwrap();
            }
            ws.close(None).await.unwrap();
        });

        let bus = PushEventBus::new();
        let mut events = bus.subscribe();
        let (command_tx, command_rx) = driver_command_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(
            driver(&format!("ws://{addr}/ws"), &bus).run(shutdown_rx, command_rx),
        );

        assert_eq!(
            next_event(&mut events).await,
            PushEvent::Connection(ConnectionEvent::Connecting)
        );
        assert_eq!(
            next_event(&mut events).await,
            PushEvent::Connection(ConnectionEvent::Connected)
        );
        command_tx.send(DriverCommand::RequestSnapshot).await.unwrap();

        assert!(matches!(
            next_event(&mut events).await,
            PushEvent::Server(ServerEvent::Status(_))
        ));
        assert_eq!(
            next_event(&mut events).await,
            PushEvent::Malformed { event: "status" }
        );
        assert_eq!(
            next_event(&mut events).await,
            PushEvent::Server(ServerEvent::VendSuccess)
        );
        assert_eq!(
            next_event(&mut events).await,
            PushEvent::Connection(ConnectionEvent::Disconnected)
        );

        server.await.unwrap();
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let bus = PushEventBus::new();
        let mut events = bus.subscribe();
        let (_command_tx, command_rx) = driver_command_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(
            driver(&format!("ws://{addr}/ws"), &bus).run(shutdown_rx, command_rx),
        );

        assert_eq!(
            next_event(&mut events).await,
            PushEvent::Connection(ConnectionEvent::Connecting)
        );
        assert_eq!(
            next_event(&mut events).await,
            PushEvent::Connection(ConnectionEvent::ConnectError)
        );

        // Shutdown interrupts the reconnect delay.
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
