//! Redeem Bridge - Connection and correlation core between a redeem backend
//! and a game.
//!
//! Viewers buy redeems through the backend; the bridge forwards each purchase
//! to the running game over a single WebSocket and hands the game's result
//! back to the caller that submitted it.
//!
//! # Architecture
//!
//! The bridge follows a client-server model:
//!
//! - **Bridge (Rust)**: Hosts the WebSocket server, submits redeems, awaits results
//! - **Game**: Connects, says hello, executes redeems, reports results
//!
//! Key design principles:
//!
//! - One event loop task owns the socket, the resend queue and the
//!   correlation maps
//! - Nothing but `Pong` is sent before the game's `Hello`
//! - Every redeem resolves exactly once: result, timeout or shutdown
//! - Failed writes are retried in order, one per resend tick
//!
//! # Quick Start
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use redeem_bridge::{Bridge, Cart, GameServer, Redeem, Result, TwitchUser};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let bridge = Bridge::builder().build()?;
//!
//!     // Accept game connections in the background
//!     let server = GameServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080).await?;
//!     tokio::spawn(server.serve(bridge.clone()));
//!
//!     let redeem = Redeem {
//!         id: "spawn_enemy".into(),
//!         title: "Spawn Enemy".into(),
//!         description: String::new(),
//!         image: String::new(),
//!         price: 100,
//!         sku: "sku-enemy".into(),
//!         announce: None,
//!     };
//!     let user = TwitchUser {
//!         id: "1234".into(),
//!         login: "viewer".into(),
//!         display_name: "Viewer".into(),
//!     };
//!
//!     let result = bridge
//!         .submit_redeem(&redeem, &Cart::default(), &user, "tx-1")
//!         .await?;
//!     println!("success: {}", result.success);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Bridge handle and configuration |
//! | [`catalog`] | Redeem, cart and viewer types |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Message guid |
//! | [`protocol`] | WebSocket message types |
//! | [`transport`] | Sockets, server and connection event loop |

// ============================================================================
// Modules
// ============================================================================

/// Bridge handle and configuration.
///
/// Use [`Bridge::builder()`] to create a configured bridge.
pub mod bridge;

/// Catalog and purchase types supplied by the backend.
pub mod catalog;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe message identifiers.
pub mod identifiers;

/// WebSocket protocol message types.
///
/// Flat JSON messages discriminated by `messageType`.
pub mod protocol;

/// Game transport layer.
///
/// Socket abstraction, WebSocket server and the connection event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{Bridge, BridgeBuilder, BridgeOptions, GameStateSink, IngameFlag};

// Catalog types
pub use catalog::{Cart, Redeem, TwitchUser};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::Guid;

// Protocol types
pub use protocol::{Body, Message, MessageType, RedeemResult, RedeemSource};

// Transport types
pub use transport::{
    ChannelPeer, ChannelSocket, ConnectionState, ConnectionStats, GameServer, GameSocket,
    SocketEvent, WsSocket,
};
