//! WebSocket server the game connects to.
//!
//! # Connection Flow
//!
//! 1. Bridge binds a WebSocket server (port 0 picks a random port)
//! 2. Game connects and completes the WebSocket upgrade
//! 3. The socket is bound to the bridge, replacing any previous game socket
//! 4. Game sends `Hello`, bridge answers `HelloBack`

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::protocol::message::duration_millis;

use super::socket::WsSocket;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for a single [`GameServer::accept`].
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// GameServer
// ============================================================================

/// A bound WebSocket server waiting for the game.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use redeem_bridge::{Bridge, GameServer};
///
/// let bridge = Bridge::builder().build()?;
/// let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
/// println!("game should connect to {}", server.ws_url());
///
/// tokio::spawn(server.serve(bridge.clone()));
/// ```
pub struct GameServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Address the server is bound to.
    addr: SocketAddr,
}

impl GameServer {
    /// Binds a WebSocket server to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let addr = listener.local_addr()?;

        debug!(%addr, "Game server bound");

        Ok(Self { listener, addr })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://{ip}:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Accepts one game connection and upgrades it to WebSocket.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if nothing connects within 30s
    /// - [`Error::Io`] if accepting fails
    /// - [`Error::Connection`] if the WebSocket upgrade fails
    pub async fn accept(&self) -> Result<WsSocket<TcpStream>> {
        let (stream, addr) = timeout(CONNECTION_TIMEOUT, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(duration_millis(CONNECTION_TIMEOUT)))??;

        debug!(%addr, "TCP connection accepted");
        Self::upgrade(stream).await
    }

    /// Accepts game connections forever, binding each to `bridge`.
    ///
    /// A new connection replaces the previous one. Returns when the bridge
    /// shuts down or the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the listener fails.
    pub async fn serve(self, bridge: Bridge) -> Result<()> {
        info!(url = %self.ws_url(), "Waiting for game connections");

        loop {
            let (stream, addr) = self.listener.accept().await?;
            debug!(%addr, "TCP connection accepted");

            let socket = match Self::upgrade(stream).await {
                Ok(socket) => socket,
                Err(e) => {
                    warn!(%addr, error = %e, "Rejected game connection");
                    continue;
                }
            };

            info!(%addr, "Game connected");

            if bridge.bind_socket(Some(socket)).is_err() {
                debug!("Bridge shut down, stopping game server");
                return Ok(());
            }
        }
    }

    async fn upgrade(stream: TcpStream) -> Result<WsSocket<TcpStream>> {
        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        Ok(WsSocket::new(ws_stream))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use crate::transport::GameSocket;

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        assert!(server.port() > 0);
        assert!(server.ws_url().starts_with("ws://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_server_ws_url_format() {
        let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        let expected = format!("ws://127.0.0.1:{}", server.port());
        assert_eq!(server.ws_url(), expected);
    }

    #[tokio::test]
    async fn test_server_local_addr() {
        let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        let addr = server.local_addr();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(addr.port(), server.port());
    }

    #[tokio::test]
    async fn test_accept_websocket() {
        let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");
        let url = server.ws_url();

        let client = tokio::spawn(async move { tokio_tungstenite::connect_async(url).await });

        let socket = server.accept().await.expect("accept");
        assert!(socket.is_open());

        let (_ws, response) = client.await.expect("join").expect("client connect");
        assert_eq!(response.status().as_u16(), 101);
    }
}
