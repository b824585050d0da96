//! Redeem bridge handle.
//!
//! The [`Bridge`] is what the redeem backend holds: it submits purchased
//! redeems to the game and reports whether the game is ready for them.
//!
//! # Example
//!
//! ```ignore
//! use redeem_bridge::{Bridge, Cart, Redeem, TwitchUser};
//!
//! let bridge = Bridge::builder().build()?;
//!
//! let result = bridge.submit_redeem(&redeem, &cart, &user, "tx-1").await?;
//! if result.success {
//!     println!("redeem applied");
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{Cart, Redeem, TwitchUser};
use crate::error::{Error, Result};
use crate::identifiers::Guid;
use crate::protocol::{Message, RedeemResult, RedeemSource};
use crate::transport::{Connection, ConnectionState, ConnectionStats, GameSocket};

use super::builder::BridgeBuilder;
use super::options::BridgeOptions;

// ============================================================================
// Bridge
// ============================================================================

/// Handle to the redeem bridge.
///
/// Cheap to clone; every clone drives the same connection. The connection
/// shuts down when [`Bridge::shutdown`] is called or the last clone drops.
#[derive(Clone)]
pub struct Bridge {
    /// Options the connection was spawned with.
    options: Arc<BridgeOptions>,
    /// Event loop handle.
    connection: Connection,
}

// ============================================================================
// Bridge - Display
// ============================================================================

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("protocol_version", &self.options.protocol_version)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Bridge - Public API
// ============================================================================

impl Bridge {
    /// Creates a configuration builder for the bridge.
    #[inline]
    #[must_use]
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Sends a redeem to the game and waits for its result.
    ///
    /// `transaction_id` becomes the message guid and the correlation key.
    /// If the game is not reachable the redeem is queued and delivered once
    /// a game completes the handshake, as long as the result arrives before
    /// the redeem timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingTransactionId`] if `transaction_id` is blank
    /// - [`Error::DuplicateRedeem`] if the id is already outstanding
    /// - [`Error::RedeemTimeout`] if the game does not answer in time
    /// - [`Error::ConnectionClosed`] if the bridge shuts down
    pub async fn submit_redeem(
        &self,
        redeem: &Redeem,
        cart: &Cart,
        user: &TwitchUser,
        transaction_id: &str,
    ) -> Result<RedeemResult> {
        let guid = Guid::new(transaction_id);
        if guid.is_blank() {
            return Err(Error::MissingTransactionId);
        }

        debug!(%guid, command = %redeem.id, user = %user.login, "Submitting redeem");

        let message = Message::redeem(guid, RedeemSource::Viewer, redeem, cart, user);
        let result = self
            .connection
            .submit_redeem(message, self.options.redeem_timeout)
            .await?;

        info!(
            guid = %result.guid,
            success = result.success,
            "Redeem completed"
        );

        Ok(result)
    }

    /// Binds the game socket, replacing and closing any previous one.
    ///
    /// `None` unbinds the current socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the bridge has shut down.
    pub fn bind_socket<S>(&self, socket: Option<S>) -> Result<()>
    where
        S: GameSocket + 'static,
    {
        self.connection
            .bind_socket(socket.map(|s| Box::new(s) as Box<dyn GameSocket>))
    }

    /// Sends an arbitrary message to the game.
    ///
    /// See [`Connection::send`] for the gating rules.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no game socket is open
    /// - [`Error::HandshakeIncomplete`] if the game has not said hello
    /// - [`Error::SendFailure`] if the write failed (message queued)
    pub async fn send(&self, message: Message) -> Result<()> {
        self.connection.send(message).await
    }

    /// Returns `true` once the game has completed the handshake.
    #[inline]
    #[must_use]
    pub fn is_handshaked(&self) -> bool {
        self.connection.is_handshaked()
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Returns pending redeem and resend queue counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the bridge has shut down.
    pub async fn stats(&self) -> Result<ConnectionStats> {
        self.connection.stats().await
    }

    /// Returns the options the bridge was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Returns the underlying connection handle.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Closes the game socket and fails every pending redeem.
    pub fn shutdown(&self) {
        info!("Shutting down redeem bridge");
        self.connection.shutdown();
    }
}

// ============================================================================
// Bridge - Internal API
// ============================================================================

impl Bridge {
    /// Wraps a spawned connection.
    pub(crate) fn new(options: BridgeOptions, connection: Connection) -> Self {
        Self {
            options: Arc::new(options),
            connection,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
