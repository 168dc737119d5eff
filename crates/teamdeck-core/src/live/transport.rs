//! Transport seam for the live client
//!
//! [`Connector`] opens a [`Session`] that yields text payloads. The
//! WebSocket implementation is [`WsConnector`]; tests plug in scripted ones.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::error::Result;

/// An open channel delivering pushed payloads
#[async_trait]
pub trait Session: Send {
    /// Next text payload. `None` once the peer has closed.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Close the channel
    async fn close(&mut self);
}

/// Opens sessions to a URL
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a session, failing if the server cannot be reached
    async fn connect(&self, url: &str) -> Result<Box<dyn Session>>;
}

/// WebSocket connector
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Session>> {
        let (ws, response) = connect_async(url).await?;
        debug!(status = %response.status(), "WebSocket handshake complete");
        Ok(Box::new(WsSession { ws }))
    }
}

struct WsSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Session for WsSession {
    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Server closed the connection");
                    return None;
                }
                // tungstenite answers pings on the next read
                Ok(other) => trace!(?other, "Ignoring control frame"),
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return None
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!(error = %e, "Error while closing WebSocket");
        }
    }
}
