//! Catalog and purchase data consumed by redeem requests.
//!
//! These shapes are owned by the backend. The bridge only reads them to
//! build the outbound `Redeem` message and performs no validation.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Redeem
// ============================================================================

/// A purchasable catalog action the game can execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redeem {
    /// Command identifier understood by the game.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Display description.
    #[serde(default)]
    pub description: String,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Price in bits.
    pub price: u32,
    /// Product SKU.
    pub sku: String,
    /// Whether the game should announce the redeem. Unset means yes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce: Option<bool>,
}

// ============================================================================
// Cart
// ============================================================================

/// Concrete arguments accompanying a specific purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Redeem id the cart was filled for.
    #[serde(default)]
    pub id: String,
    /// Product SKU.
    pub sku: String,
    /// Arguments keyed by parameter name.
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

// ============================================================================
// TwitchUser
// ============================================================================

/// Viewer identity attached to a redeem request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitchUser {
    /// Twitch user id.
    pub id: String,
    /// Login name.
    pub login: String,
    /// Display name.
    pub display_name: String,
}

// ============================================================================
// Tests
// ============================================================================
