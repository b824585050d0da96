//! Bridge options.
//!
//! Provides a type-safe interface for the protocol version and the
//! timing constants of the connection core. All values can be overridden,
//! which tests use to shrink timers.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use redeem_bridge::BridgeOptions;
//!
//! let options = BridgeOptions::new()
//!     .with_protocol_version("0.2.0")
//!     .with_redeem_timeout(Duration::from_secs(5));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Protocol version the game must announce to be allowed.
pub const DEFAULT_PROTOCOL_VERSION: &str = "0.1.0";

/// Interval between resend attempts.
pub const DEFAULT_RESEND_INTERVAL: Duration = Duration::from_millis(500);

/// How long a redeem waits for the game's result.
pub const DEFAULT_REDEEM_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// BridgeOptions
// ============================================================================

/// Connection core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Version string the game's `Hello` must match exactly.
    pub protocol_version: String,

    /// Interval of the resend timer. One queued message is retried per tick.
    pub resend_interval: Duration,

    /// Deadline for a redeem's result.
    pub redeem_timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeOptions {
    /// Creates options with the default version and timers.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            resend_interval: DEFAULT_RESEND_INTERVAL,
            redeem_timeout: DEFAULT_REDEEM_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeOptions {
    /// Sets the protocol version.
    #[inline]
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Sets the resend interval.
    #[inline]
    #[must_use]
    pub fn with_resend_interval(mut self, interval: Duration) -> Self {
        self.resend_interval = interval;
        self
    }

    /// Sets the redeem result timeout.
    #[inline]
    #[must_use]
    pub fn with_redeem_timeout(mut self, timeout: Duration) -> Self {
        self.redeem_timeout = timeout;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl BridgeOptions {
    /// Checks the options for values the event loop cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the version is empty or a duration is zero.
    pub fn validate(&self) -> Result<()> {
        if self.protocol_version.trim().is_empty() {
            return Err(Error::config("protocol version must not be empty"));
        }

        if self.resend_interval.is_zero() {
            return Err(Error::config("resend interval must be greater than zero"));
        }

        if self.redeem_timeout.is_zero() {
            return Err(Error::config("redeem timeout must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
