//! Redeem request and result bodies.
//!
//! See [`Body::Redeem`](super::Body::Redeem) and
//! [`Body::Result`](super::Body::Result).

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::TwitchUser;
use crate::identifiers::Guid;

// ============================================================================
// RedeemSource
// ============================================================================

/// Who triggered a redeem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RedeemSource {
    /// Paid for by a viewer.
    #[default]
    Viewer,
    /// Issued by a developer for testing.
    Dev,
}

// ============================================================================
// RedeemBody
// ============================================================================

/// Body of an outbound `Redeem` message.
///
/// # Format
///
/// ```json
/// {
///   "messageType": "Redeem",
///   "guid": "transaction-id",
///   "timestamp": 1700000000000,
///   "source": "viewer",
///   "command": "spawn_enemy",
///   "title": "Spawn Enemy",
///   "announce": true,
///   "args": { "count": "3" },
///   "user": { "id": "1234", "login": "viewer", "displayName": "Viewer" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemBody {
    /// Who triggered the redeem.
    pub source: RedeemSource,
    /// Command identifier for the game.
    pub command: String,
    /// Title for in-game display.
    pub title: String,
    /// Whether the game should announce the redeem.
    pub announce: bool,
    /// Arguments from the cart.
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    /// Viewer who redeemed.
    pub user: TwitchUser,
}

// ============================================================================
// ResultBody
// ============================================================================

/// Body of an inbound `Result` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBody {
    /// Whether the game executed the redeem.
    pub success: bool,
    /// Optional game-defined detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

// ============================================================================
// RedeemResult
// ============================================================================

/// A game result delivered to the caller of a redeem.
#[derive(Debug, Clone, PartialEq)]
pub struct RedeemResult {
    /// Transaction id the result belongs to.
    pub guid: Guid,
    /// Time the game produced the result (epoch ms).
    pub timestamp: u64,
    /// Whether the game executed the redeem.
    pub success: bool,
    /// Optional game-defined detail.
    pub payload: Option<Value>,
}

impl RedeemResult {
    /// Creates a result from an inbound message's parts.
    #[inline]
    #[must_use]
    pub fn new(guid: Guid, timestamp: u64, body: ResultBody) -> Self {
        Self {
            guid,
            timestamp,
            success: body.success,
            payload: body.payload,
        }
    }

    /// Gets a string value from the payload.
    ///
    /// Returns `None` if the payload is absent, is a non-string, or lacks the key.
    #[must_use]
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.as_ref()?.get(key)?.as_str()
    }
}

// ============================================================================
// Tests
// ============================================================================
