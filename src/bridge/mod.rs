//! Redeem bridge entry point.
//!
//! This module provides the handle the redeem backend uses to reach the game.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bridge`] | Submits redeems, reports handshake state |
//! | [`BridgeBuilder`] | Fluent configuration builder |
//! | [`BridgeOptions`] | Protocol version and timers |
//! | [`GameStateSink`] | Receiver of in-game status |
//! | [`IngameFlag`] | Shared in-game flag |
//!
//! # Example
//!
//! ```ignore
//! use std::net::{IpAddr, Ipv4Addr};
//! use redeem_bridge::{Bridge, GameServer, IngameFlag, Result};
//!
//! # async fn example() -> Result<()> {
//! let ingame = IngameFlag::new();
//! let bridge = Bridge::builder().state_sink(ingame.clone()).build()?;
//!
//! let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080).await?;
//! tokio::spawn(server.serve(bridge.clone()));
//!
//! let result = bridge.submit_redeem(&redeem, &cart, &user, "tx-1").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for bridge configuration.
pub mod builder;

/// Core bridge implementation.
pub mod core;

/// Protocol version and timer options.
pub mod options;

/// In-game status sink.
pub mod sink;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::BridgeBuilder;
pub use core::Bridge;
pub use options::{
    BridgeOptions, DEFAULT_PROTOCOL_VERSION, DEFAULT_REDEEM_TIMEOUT, DEFAULT_RESEND_INTERVAL,
};
pub use sink::{GameStateSink, IngameFlag};
