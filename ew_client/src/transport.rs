//! Message transport to the game server.
//!
//! [`Transport`] is the seam between the connection manager and the wire.
//! The WebSocket implementation only ever yields text frames; control and
//! binary frames are handled or skipped here.

use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("failed to send frame: {0}")]
    Send(#[source] Box<tungstenite::Error>),
    #[error("failed to receive frame: {0}")]
    Receive(#[source] Box<tungstenite::Error>),
    #[error("transport is closed")]
    Closed,
}

/// A bidirectional text-frame connection.
pub trait Transport: Send + 'static {
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Next inbound text frame. `None` once the peer has closed.
    ///
    /// Must be cancel safe: it's raced against outbound frames.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Opens transports.
pub trait Connector {
    type Transport: Transport;

    fn open(&self, url: &Url) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    async fn open(&self, url: &Url) -> Result<WebSocketTransport, TransportError> {
        let (stream, _) =
            connect_async(url.as_str())
                .await
                .map_err(|error| TransportError::Open {
                    url: url.to_string(),
                    source: Box::new(error),
                })?;
        Ok(WebSocketTransport { stream })
    }
}

pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for WebSocketTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(frame.into()))
            .await
            .map_err(|error| TransportError::Send(Box::new(error)))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    if let Some(frame) = frame {
                        tracing::info!(code = %frame.code, reason = %frame.reason, "server closed connection");
                    }
                    return None;
                }
                // tungstenite answers pings itself
                Ok(_) => {}
                Err(tungstenite::Error::ConnectionClosed) => return None,
                Err(error) => return Some(Err(TransportError::Receive(Box::new(error)))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(error) => Err(TransportError::Send(Box::new(error))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Open {
            url: "ws://localhost:8000/ws/game".to_string(),
            source: Box::new(tungstenite::Error::ConnectionClosed),
        };
        let msg = err.to_string();
        assert!(msg.contains("ws://localhost:8000/ws/game"));
        assert_eq!(TransportError::Closed.to_string(), "transport is closed");
    }

    #[tokio::test]
    async fn test_open_refused() {
        // nothing listens on port 9 of localhost in a test sandbox
        let url = Url::parse("ws://127.0.0.1:9/ws/game").unwrap();
        let result = WebSocketConnector.open(&url).await;
        assert!(matches!(result, Err(TransportError::Open { .. })));
    }
}
