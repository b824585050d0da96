//! Game transport layer.
//!
//! This module handles communication between the bridge and the game.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Bridge (Rust)  │                              │  Game           │
//! │                 │         WebSocket            │                 │
//! │  GameServer     │◄────────────────────────────►│  WebSocket      │
//! │  → Connection   │      ws://HOST:PORT          │  Client         │
//! │                 │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `GameServer::bind` - Bind the WebSocket server
//! 2. `GameServer::serve` - Accept the game and bind its socket
//! 3. `Connection` - Handshake, dispatch, redeem correlation, resend
//! 4. Socket close - Handshake reset, game reported not in game
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | In-memory socket pair |
//! | `connection` | Event loop and correlation |
//! | `correlation` | Redeem correlation tracker |
//! | `resend` | Resend queue |
//! | `server` | WebSocket server |
//! | `socket` | Socket trait and WebSocket adapter |

// ============================================================================
// Submodules
// ============================================================================

/// In-memory socket pair.
pub mod channel;

/// Game connection and event loop.
pub mod connection;

/// Redeem correlation tracker.
pub mod correlation;

/// Resend queue for rejected writes.
pub mod resend;

/// WebSocket server for game connections.
pub mod server;

/// Socket abstraction and WebSocket adapter.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ChannelPeer, ChannelSocket};
pub use connection::{Connection, ConnectionState, ConnectionStats};
pub use correlation::RedeemTracker;
pub use resend::ResendQueue;
pub use server::GameServer;
pub use socket::{GameSocket, SocketEvent, WsSocket};
