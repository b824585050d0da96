//! Socket abstraction handed to the bridge.
//!
//! The event loop only needs a bidirectional text socket. [`GameSocket`]
//! captures that contract so the bridge can run over a WebSocket
//! ([`WsSocket`]) or any other transport adapted to it
//! ([`ChannelSocket`](super::ChannelSocket)).

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// SocketEvent
// ============================================================================

/// Something that happened on a socket.
#[derive(Debug)]
pub enum SocketEvent {
    /// A text payload arrived.
    Message(String),

    /// The socket closed, by either side.
    Close {
        /// Close code, if the peer sent one.
        code: Option<u16>,
        /// Close reason, possibly empty.
        reason: String,
    },

    /// A transport error. Does not imply closure.
    Error(Error),
}

// ============================================================================
// GameSocket
// ============================================================================

/// A bidirectional text socket to the game.
///
/// # Cancel Safety
///
/// [`GameSocket::recv`] is polled inside `tokio::select!` and must be cancel
/// safe: dropping the future before completion must not lose an event.
#[async_trait]
pub trait GameSocket: Send {
    /// Returns `true` while the socket can carry traffic.
    fn is_open(&self) -> bool;

    /// Writes one text payload.
    async fn send(&mut self, text: String) -> Result<()>;

    /// Waits for the next socket event.
    ///
    /// After [`SocketEvent::Close`] the socket is not polled again.
    async fn recv(&mut self) -> SocketEvent;

    /// Closes the socket.
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// WsSocket
// ============================================================================

/// [`GameSocket`] over a `tokio-tungstenite` WebSocket stream.
///
/// Text frames are surfaced as messages. Binary, ping and pong frames are
/// skipped (tungstenite answers pings itself).
pub struct WsSocket<S> {
    /// Underlying WebSocket stream.
    stream: WebSocketStream<S>,
    /// Cleared once a close frame, end of stream or fatal error is seen.
    open: bool,
}

impl<S> WsSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an established WebSocket stream.
    #[inline]
    #[must_use]
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self { stream, open: true }
    }

    /// Marks the socket closed if the error means the connection is gone.
    fn observe_error(&mut self, error: &WsError) {
        if matches!(
            error,
            WsError::ConnectionClosed
                | WsError::AlreadyClosed
                | WsError::Io(_)
                | WsError::Protocol(_)
        ) {
            self.open = false;
        }
    }
}

#[async_trait]
impl<S> GameSocket for WsSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn is_open(&self) -> bool {
        self.open
    }

    async fn send(&mut self, text: String) -> Result<()> {
        if let Err(e) = self.stream.send(WsMessage::Text(text.into())).await {
            self.observe_error(&e);
            return Err(e.into());
        }
        Ok(())
    }

    async fn recv(&mut self) -> SocketEvent {
        // A fatal error was already reported as `SocketEvent::Error`.
        if !self.open {
            return SocketEvent::Close {
                code: None,
                reason: String::new(),
            };
        }

        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return SocketEvent::Message(text.as_str().to_owned());
                }

                Some(Ok(WsMessage::Close(frame))) => {
                    self.open = false;
                    let (code, reason) = match frame {
                        Some(frame) => (
                            Some(u16::from(frame.code)),
                            frame.reason.as_str().to_owned(),
                        ),
                        None => (None, String::new()),
                    };
                    return SocketEvent::Close { code, reason };
                }

                Some(Err(e)) => {
                    self.observe_error(&e);
                    return SocketEvent::Error(e.into());
                }

                None => {
                    self.open = false;
                    return SocketEvent::Close {
                        code: None,
                        reason: String::new(),
                    };
                }

                // Binary, Ping, Pong, Frame
                Some(Ok(other)) => {
                    trace!(len = other.len(), "Skipping non-text frame");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
