//! Push-channel client.
//!
//! Opens the WebSocket, sends [`ClientEvent`]s and yields decoded
//! [`ServerEvent`]s. Reconnecting is left to the caller.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::ClientError;
use crate::objects::push::{ClientEvent, FrameError, ServerEvent, decode_frame};

/// Connects to the push channel.
#[derive(Debug, Clone)]
pub struct PushClient {
    url: Url,
    connect_timeout: Duration,
}

impl PushClient {
    /// * `url` – `ws://` or `wss://` URL of the push endpoint.
    /// * `connect_timeout` – how long the handshake may take before
    ///   [`ClientError::ConnectTimeout`] is returned.
    pub fn new(url: Url, connect_timeout: Duration) -> Self {
        Self {
            url,
            connect_timeout,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Open a new session.
    pub async fn connect(&self) -> Result<PushSession, ClientError> {
        let (stream, _response) =
            tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
                .await
                .map_err(|_| ClientError::ConnectTimeout)??;
        Ok(PushSession { stream })
    }
}

/// One frame received from the server.
#[derive(Debug)]
pub enum Inbound {
    Event(ServerEvent),
    /// The frame could not be decoded. The session stays usable.
    Invalid(FrameError),
}

/// An open push connection.
pub struct PushSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl PushSession {
    /// Send a client event as a JSON text frame.
    pub async fn send(&mut self, event: ClientEvent) -> Result<(), ClientError> {
        let frame = event.to_frame()?;
        self.stream.send(Message::Text(frame)).await?;
        Ok(())
    }

    /// Wait for the next text frame.
    ///
    /// Returns `Ok(None)` once the server closes the connection. Control
    /// and binary frames are skipped. Cancel-safe.
    pub async fn next(&mut self) -> Result<Option<Inbound>, ClientError> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => {
                    return Ok(Some(match decode_frame(&text) {
                        Ok(event) => Inbound::Event(event),
                        Err(e) => Inbound::Invalid(e),
                    }));
                }
                Message::Close(frame) => {
                    tracing::debug!(?frame, "push channel closed by server");
                    return Ok(None);
                }
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Close the connection with a normal close frame.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
