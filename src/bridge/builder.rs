//! Builder pattern for bridge configuration.
//!
//! Provides a fluent API for configuring and creating [`Bridge`] instances.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use redeem_bridge::{Bridge, IngameFlag};
//!
//! let ingame = IngameFlag::new();
//! let bridge = Bridge::builder()
//!     .protocol_version("0.1.0")
//!     .redeem_timeout(Duration::from_secs(5))
//!     .state_sink(ingame.clone())
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::transport::Connection;

use super::core::Bridge;
use super::options::BridgeOptions;
use super::sink::GameStateSink;

// ============================================================================
// BridgeBuilder
// ============================================================================

/// Builder for configuring a [`Bridge`] instance.
///
/// Use [`Bridge::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct BridgeBuilder {
    /// Version and timers.
    options: BridgeOptions,
    /// Receiver of in-game status updates.
    state_sink: Option<Arc<dyn GameStateSink>>,
}

impl fmt::Debug for BridgeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("options", &self.options)
            .field("has_state_sink", &self.state_sink.is_some())
            .finish()
    }
}

// ============================================================================
// BridgeBuilder Implementation
// ============================================================================

impl BridgeBuilder {
    /// Creates a builder with default options and no state sink.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: BridgeOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the protocol version the game must announce.
    #[inline]
    #[must_use]
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.options = self.options.with_protocol_version(version);
        self
    }

    /// Sets the interval between resend attempts.
    #[inline]
    #[must_use]
    pub fn resend_interval(mut self, interval: Duration) -> Self {
        self.options = self.options.with_resend_interval(interval);
        self
    }

    /// Sets how long a redeem waits for the game's result.
    #[inline]
    #[must_use]
    pub fn redeem_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_redeem_timeout(timeout);
        self
    }

    /// Sets the receiver of in-game status updates.
    ///
    /// Accepts an [`IngameFlag`](super::IngameFlag) or any `Fn(bool)` closure.
    #[inline]
    #[must_use]
    pub fn state_sink(mut self, sink: impl GameStateSink + 'static) -> Self {
        self.state_sink = Some(Arc::new(sink));
        self
    }

    /// Validates the options and spawns the connection event loop.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn build(self) -> Result<Bridge> {
        self.options.validate()?;

        let state_sink: Arc<dyn GameStateSink> = match self.state_sink {
            Some(sink) => sink,
            None => Arc::new(|_ingame: bool| {}),
        };

        let connection = Connection::spawn(self.options.clone(), state_sink);

        Ok(Bridge::new(self.options, connection))
    }
}

// ============================================================================
// Tests
// ============================================================================
