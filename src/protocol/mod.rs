//! Game protocol message types.
//!
//! This module defines the message format exchanged between the bridge
//! and the game over the socket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Hello` | Game → Bridge | Announce protocol version |
//! | `HelloBack` | Bridge → Game | Accept or refuse the version |
//! | `Ping` | Game → Bridge | Liveness probe |
//! | `Pong` | Bridge → Game | Liveness answer |
//! | `Redeem` | Bridge → Game | Execute a purchased redeem |
//! | `Result` | Game → Bridge | Outcome of a redeem |
//! | `IngameStateChanged` | Game → Bridge | Player entered or left gameplay |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Envelope, tagged body and JSON codec |
//! | `redeem` | Redeem request and result bodies |

// ============================================================================
// Submodules
// ============================================================================

/// Message envelope, body variants and codec.
pub mod message;

/// Redeem request and result bodies.
pub mod redeem;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{Body, Message, MessageType};
pub use redeem::{RedeemBody, RedeemResult, RedeemSource, ResultBody};
