//! Transport seam and the websocket adapter.
//!
//! The session driver only ever talks to [`Transport`] / [`TransportConn`],
//! so tests can substitute a scripted in-memory transport and the driver's
//! state machine runs without a network.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use waypoint_core::SessionError;

/// Opens one logical connection to the location server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish a connection to `endpoint`.
    ///
    /// The driver bounds this call with its connect timeout; implementations
    /// need no internal deadline.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn TransportConn>, SessionError>;
}

/// One established connection.
#[async_trait]
pub trait TransportConn: Send {
    /// Send one text frame.
    async fn send_text(&mut self, text: &str) -> Result<(), SessionError>;

    /// Receive the next text payload.
    ///
    /// Returns `None` when the peer closed the connection, `Some(Err(_))` on
    /// a transport fault. Both feed the reconnect path.
    async fn next_frame(&mut self) -> Option<Result<String, SessionError>>;

    /// Close the connection. Best-effort; errors are ignored.
    async fn close(&mut self);
}

/// The production websocket transport (`tokio-tungstenite`).
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn TransportConn>, SessionError> {
        let (stream, _response) = connect_async(endpoint)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(Box::new(WsConn { stream }))
    }
}

struct WsConn {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl TransportConn for WsConn {
    async fn send_text(&mut self, text: &str) -> Result<(), SessionError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    async fn next_frame(&mut self) -> Option<Result<String, SessionError>> {
        while let Some(item) = self.stream.next().await {
            match item {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                // Some servers send text payloads as binary frames.
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => return Some(Ok(text.to_owned())),
                    Err(_) => {
                        debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    }
                },
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Close(_)) => return None,
                Err(e) => return Some(Err(SessionError::Transport(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Whether an endpoint looks like a websocket URL.
///
/// Anything else fails the session fast with `InvalidEndpoint` instead of
/// handing garbage to the connector.
#[must_use]
pub fn endpoint_is_valid(endpoint: &str) -> bool {
    let rest = endpoint
        .strip_prefix("wss://")
        .or_else(|| endpoint.strip_prefix("ws://"));
    rest.is_some_and(|host| !host.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
