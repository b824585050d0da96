//! In-memory socket pair.
//!
//! [`ChannelSocket`] is the bridge side; [`ChannelPeer`] plays the game.
//! Useful when the game traffic arrives over a transport the bridge does
//! not speak natively, and for exercising the event loop without a network.
//!
//! # Example
//!
//! ```ignore
//! let (socket, peer) = ChannelSocket::pair();
//! bridge.bind_socket(Some(socket));
//!
//! peer.send_message(&Message::new(Body::Hello { version: "0.1.0".into() }))?;
//! let hello_back = peer.recv_message().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::error::{Error, Result};
use crate::protocol::Message;

use super::socket::{GameSocket, SocketEvent};

// ============================================================================
// Shared Flags
// ============================================================================

/// Switches shared by both ends of the pair.
#[derive(Debug)]
struct Flags {
    /// Socket accepts traffic.
    open: AtomicBool,
    /// Every send is rejected while set.
    fail_sends: AtomicBool,
}

// ============================================================================
// ChannelSocket
// ============================================================================

/// Bridge end of an in-memory socket pair.
pub struct ChannelSocket {
    /// Events injected by the peer.
    events_rx: mpsc::UnboundedReceiver<SocketEvent>,
    /// Payloads written to the peer.
    outbound_tx: mpsc::UnboundedSender<String>,
    /// Shared switches.
    flags: Arc<Flags>,
}

impl ChannelSocket {
    /// Creates a connected socket pair.
    #[must_use]
    pub fn pair() -> (Self, ChannelPeer) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let flags = Arc::new(Flags {
            open: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
        });

        let socket = Self {
            events_rx,
            outbound_tx,
            flags: Arc::clone(&flags),
        };
        let peer = ChannelPeer {
            events_tx,
            outbound_rx: Mutex::new(outbound_rx),
            flags,
        };

        (socket, peer)
    }
}

#[async_trait]
impl GameSocket for ChannelSocket {
    fn is_open(&self) -> bool {
        self.flags.open.load(Ordering::SeqCst)
    }

    async fn send(&mut self, text: String) -> Result<()> {
        if self.flags.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::connection("send rejected by peer"));
        }

        self.outbound_tx
            .send(text)
            .map_err(|_| Error::connection("peer dropped"))
    }

    async fn recv(&mut self) -> SocketEvent {
        match self.events_rx.recv().await {
            Some(event) => {
                if matches!(event, SocketEvent::Close { .. }) {
                    self.flags.open.store(false, Ordering::SeqCst);
                }
                event
            }
            None => {
                self.flags.open.store(false, Ordering::SeqCst);
                SocketEvent::Close {
                    code: None,
                    reason: "peer dropped".to_string(),
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.flags.open.store(false, Ordering::SeqCst);
        self.events_rx.close();
        Ok(())
    }
}

// ============================================================================
// ChannelPeer
// ============================================================================

/// Game end of an in-memory socket pair.
pub struct ChannelPeer {
    /// Events delivered to the bridge.
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    /// Payloads the bridge wrote.
    outbound_rx: Mutex<mpsc::UnboundedReceiver<String>>,
    /// Shared switches.
    flags: Arc<Flags>,
}

impl ChannelPeer {
    /// Delivers a raw text payload to the bridge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the bridge end is gone.
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.push(SocketEvent::Message(text.into()))
    }

    /// Encodes and delivers a message to the bridge.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if encoding fails
    /// - [`Error::ConnectionClosed`] if the bridge end is gone
    pub fn send_message(&self, message: &Message) -> Result<()> {
        self.send_text(message.encode()?)
    }

    /// Closes the socket from the game side.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the bridge end is gone.
    pub fn close(&self, code: u16, reason: impl Into<String>) -> Result<()> {
        self.push(SocketEvent::Close {
            code: Some(code),
            reason: reason.into(),
        })
    }

    /// Reports a transport error to the bridge without closing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the bridge end is gone.
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.push(SocketEvent::Error(Error::connection(message)))
    }

    /// Waits for the next payload the bridge wrote.
    ///
    /// Returns `None` once the bridge end is dropped.
    pub async fn recv_text(&self) -> Option<String> {
        self.outbound_rx.lock().await.recv().await
    }

    /// Waits for and decodes the next message the bridge wrote.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the bridge end is dropped
    /// - [`Error::Parse`] if the payload is not a message
    pub async fn recv_message(&self) -> Result<Message> {
        let text = self.recv_text().await.ok_or(Error::ConnectionClosed)?;
        Message::decode(&text)
    }

    /// Returns the next written payload without waiting.
    pub fn try_recv_text(&self) -> Option<String> {
        self.outbound_rx.try_lock().ok()?.try_recv().ok()
    }

    /// Makes every subsequent bridge send fail (or succeed again).
    pub fn set_fail_sends(&self, fail: bool) {
        self.flags.fail_sends.store(fail, Ordering::SeqCst);
    }

    fn push(&self, event: SocketEvent) -> Result<()> {
        self.events_tx
            .send(event)
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// Tests
// ============================================================================
