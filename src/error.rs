//! Error types for the redeem bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use redeem_bridge::{Error, Result};
//!
//! async fn example(bridge: &Bridge) -> Result<()> {
//!     let result = bridge.submit_redeem(&redeem, &cart, &user, "tx-1").await?;
//!     println!("game replied: success={}", result.success);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::NotConnected`], [`Error::HandshakeIncomplete`], [`Error::SendFailure`], [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Redeem | [`Error::MissingTransactionId`], [`Error::DuplicateRedeem`], [`Error::RedeemTimeout`] |
//! | Peer | [`Error::Parse`], [`Error::UnknownMessageType`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Peer errors originate from malformed game traffic. The event loop logs
//! and absorbs them; they are never handed to callers.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::Guid;
use crate::protocol::MessageType;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when bridge options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// No open game socket is bound.
    #[error("Not connected to the game")]
    NotConnected,

    /// A message other than `Pong` was sent before the game said hello.
    #[error("Handshake incomplete, cannot send {message_type}")]
    HandshakeIncomplete {
        /// Type of the rejected message.
        message_type: MessageType,
    },

    /// The transport rejected the write.
    ///
    /// The message has been queued for resend.
    #[error("Failed to send {guid}: {message}")]
    SendFailure {
        /// Guid of the message that failed to send.
        guid: Guid,
        /// Description of the transport failure.
        message: String,
    },

    /// Transport level connection error.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Timeout waiting for the game to connect.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The bridge event loop has shut down.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Redeem Errors
    // ========================================================================
    /// Redeem submitted without a transaction id.
    #[error("Missing transaction id")]
    MissingTransactionId,

    /// The transaction already has an outstanding redeem.
    #[error("Redeem {guid} is already in progress")]
    DuplicateRedeem {
        /// The duplicated transaction id.
        guid: Guid,
    },

    /// The game did not report a result in time.
    ///
    /// The redeem is not retracted and may still complete later.
    #[error(
        "Redeem {guid} timed out after {timeout_ms}ms. The game may still complete it later."
    )]
    RedeemTimeout {
        /// Transaction id of the redeem.
        guid: Guid,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Peer Errors
    // ========================================================================
    /// Inbound payload could not be parsed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// Inbound payload carries a message type this bridge does not know.
    #[error("Unknown message type: {message_type}")]
    UnknownMessageType {
        /// The unrecognized discriminant.
        message_type: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a handshake incomplete error.
    #[inline]
    pub fn handshake_incomplete(message_type: MessageType) -> Self {
        Self::HandshakeIncomplete { message_type }
    }

    /// Creates a send failure error.
    #[inline]
    pub fn send_failure(guid: Guid, message: impl Into<String>) -> Self {
        Self::SendFailure {
            guid,
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a duplicate redeem error.
    #[inline]
    pub fn duplicate_redeem(guid: Guid) -> Self {
        Self::DuplicateRedeem { guid }
    }

    /// Creates a redeem timeout error.
    #[inline]
    pub fn redeem_timeout(guid: Guid, timeout_ms: u64) -> Self {
        Self::RedeemTimeout { guid, timeout_ms }
    }

    /// Creates a parse error.
    #[inline]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates an unknown message type error.
    #[inline]
    pub fn unknown_message_type(message_type: impl Into<String>) -> Self {
        Self::UnknownMessageType {
            message_type: message_type.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RedeemTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::HandshakeIncomplete { .. }
                | Self::SendFailure { .. }
                | Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error was caused by malformed game traffic.
    #[inline]
    #[must_use]
    pub fn is_peer_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::UnknownMessageType { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::HandshakeIncomplete { .. }
                | Self::SendFailure { .. }
                | Self::ConnectionTimeout { .. }
                | Self::RedeemTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_handshake_incomplete_display() {
        let err = Error::handshake_incomplete(MessageType::Redeem);
        assert_eq!(err.to_string(), "Handshake incomplete, cannot send Redeem");
    }

    #[test]
    fn test_redeem_timeout_message_mentions_late_completion() {
        let err = Error::redeem_timeout(Guid::new("tx-1"), 10_000);
        let text = err.to_string();

        assert!(text.contains("tx-1"));
        assert!(text.contains("10000ms"));
        assert!(text.contains("may still complete"));
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::redeem_timeout(Guid::new("tx-1"), 5000);
        let other_err = Error::NotConnected;

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::handshake_incomplete(MessageType::HelloBack).is_connection_error());
        assert!(Error::send_failure(Guid::new("a"), "broken pipe").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::MissingTransactionId.is_connection_error());
    }

    #[test]
    fn test_is_peer_error() {
        assert!(Error::parse("eof").is_peer_error());
        assert!(Error::unknown_message_type("Dance").is_peer_error());
        assert!(!Error::duplicate_redeem(Guid::new("tx")).is_peer_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::send_failure(Guid::new("a"), "reset").is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
        assert!(!Error::duplicate_redeem(Guid::new("tx")).is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::AddrInUse, "port taken");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
