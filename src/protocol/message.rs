//! Message envelope and body variants.
//!
//! # Format
//!
//! Every message is a flat JSON object:
//!
//! ```json
//! {
//!   "messageType": "Hello",
//!   "guid": "550e8400-e29b-41d4-a716-446655440000",
//!   "timestamp": 1700000000000,
//!   "version": "0.1.0"
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{from_str, to_string};

use crate::catalog::{Cart, Redeem, TwitchUser};
use crate::error::{Error, Result};
use crate::identifiers::Guid;

use super::redeem::{RedeemBody, RedeemSource, ResultBody};

// ============================================================================
// MessageType
// ============================================================================

/// Wire discriminant stored in the `messageType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Game → bridge: protocol version announcement.
    Hello,
    /// Bridge → game: handshake answer.
    HelloBack,
    /// Game → bridge: liveness probe.
    Ping,
    /// Bridge → game: liveness answer.
    Pong,
    /// Bridge → game: execute a redeem.
    Redeem,
    /// Game → bridge: outcome of a redeem.
    Result,
    /// Game → bridge: player entered or left gameplay.
    IngameStateChanged,
}

impl MessageType {
    /// All known discriminants.
    pub const ALL: [Self; 7] = [
        Self::Hello,
        Self::HelloBack,
        Self::Ping,
        Self::Pong,
        Self::Redeem,
        Self::Result,
        Self::IngameStateChanged,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "Hello",
            Self::HelloBack => "HelloBack",
            Self::Ping => "Ping",
            Self::Pong => "Pong",
            Self::Redeem => "Redeem",
            Self::Result => "Result",
            Self::IngameStateChanged => "IngameStateChanged",
        }
    }

    /// Looks up a discriminant by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Returns `true` for types the game sends to the bridge.
    #[inline]
    #[must_use]
    pub const fn is_inbound(self) -> bool {
        matches!(
            self,
            Self::Hello | Self::Ping | Self::Result | Self::IngameStateChanged
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Body
// ============================================================================

/// Variant-specific message content, tagged by `messageType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType")]
pub enum Body {
    /// Game announces its protocol version.
    Hello {
        /// Game's protocol version.
        version: String,
    },

    /// Bridge answers the handshake.
    HelloBack {
        /// `true` if the game's version matches exactly.
        allowed: bool,
    },

    /// Liveness probe from the game.
    Ping,

    /// Liveness answer to the game.
    Pong,

    /// Redeem request for the game to execute.
    Redeem(RedeemBody),

    /// Redeem outcome reported by the game.
    Result(ResultBody),

    /// Player entered or left gameplay.
    IngameStateChanged {
        /// Whether the player is currently in game.
        ingame: bool,
    },
}

impl Body {
    /// Returns the wire discriminant of this body.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Hello { .. } => MessageType::Hello,
            Self::HelloBack { .. } => MessageType::HelloBack,
            Self::Ping => MessageType::Ping,
            Self::Pong => MessageType::Pong,
            Self::Redeem(_) => MessageType::Redeem,
            Self::Result(_) => MessageType::Result,
            Self::IngameStateChanged { .. } => MessageType::IngameStateChanged,
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// A protocol message: envelope fields plus a tagged body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Correlation identifier.
    pub guid: Guid,

    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,

    /// Tagged variant content.
    #[serde(flatten)]
    pub body: Body,
}

/// Minimal view used to classify a payload before full parsing.
#[derive(Deserialize)]
struct Header {
    #[serde(rename = "messageType")]
    message_type: String,
}

impl Message {
    /// Creates a message with an explicit guid, stamped now.
    #[inline]
    #[must_use]
    pub fn with_guid(guid: Guid, body: Body) -> Self {
        Self {
            guid,
            timestamp: now_millis(),
            body,
        }
    }

    /// Creates a message with a freshly generated guid.
    #[inline]
    #[must_use]
    pub fn new(body: Body) -> Self {
        Self::with_guid(Guid::generate(), body)
    }

    /// Creates a `HelloBack` answer.
    #[inline]
    #[must_use]
    pub fn hello_back(allowed: bool) -> Self {
        Self::new(Body::HelloBack { allowed })
    }

    /// Creates a `Pong` answer.
    #[inline]
    #[must_use]
    pub fn pong() -> Self {
        Self::new(Body::Pong)
    }

    /// Creates a `Redeem` request correlated by `transaction_id`.
    ///
    /// `announce` falls back to `true` when the catalog item leaves it unset.
    #[must_use]
    pub fn redeem(
        transaction_id: Guid,
        source: RedeemSource,
        redeem: &Redeem,
        cart: &Cart,
        user: &TwitchUser,
    ) -> Self {
        Self::with_guid(
            transaction_id,
            Body::Redeem(RedeemBody {
                source,
                command: redeem.id.clone(),
                title: redeem.title.clone(),
                announce: redeem.announce.unwrap_or(true),
                args: cart.args.clone(),
                user: user.clone(),
            }),
        )
    }

    /// Returns the wire discriminant.
    #[inline]
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    /// Serializes the message to its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }

    /// Parses a JSON text payload.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownMessageType`] if `messageType` names no known type
    /// - [`Error::Parse`] if the payload is not a well formed message
    pub fn decode(text: &str) -> Result<Self> {
        let header: Header = from_str(text).map_err(|e| Error::parse(e.to_string()))?;

        if MessageType::from_name(&header.message_type).is_none() {
            return Err(Error::unknown_message_type(header.message_type));
        }

        from_str(text).map_err(|e| Error::parse(e.to_string()))
    }
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_millis)
        .unwrap_or_default()
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use serde_json::Value;

    fn sample_redeem(announce: Option<bool>) -> Redeem {
        Redeem {
            id: "spawn_enemy".into(),
            title: "Spawn Enemy".into(),
            description: "Spawns an enemy near the player".into(),
            image: "https://example.com/enemy.png".into(),
            price: 100,
            sku: "bits100".into(),
            announce,
        }
    }

    fn sample_user() -> TwitchUser {
        TwitchUser {
            id: "1234".into(),
            login: "viewer".into(),
            display_name: "Viewer".into(),
        }
    }

    #[test]
    fn test_message_type_names() {
        for kind in MessageType::ALL {
            assert_eq!(MessageType::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageType::from_name("Dance"), None);
    }

    #[test]
    fn test_inbound_direction() {
        assert!(MessageType::Hello.is_inbound());
        assert!(MessageType::Result.is_inbound());
        assert!(!MessageType::Pong.is_inbound());
        assert!(!MessageType::Redeem.is_inbound());
    }

    #[test]
    fn test_pong_encoding() {
        let json = Message::pong().encode().expect("encode");
        let value: Value = serde_json::from_str(&json).expect("json");

        assert_eq!(value["messageType"], "Pong");
        assert!(value["guid"].is_string());
        assert!(value["timestamp"].as_u64().unwrap_or_default() > 0);
    }

    #[test]
    fn test_hello_back_encoding() {
        let json = Message::hello_back(false).encode().expect("encode");
        let value: Value = serde_json::from_str(&json).expect("json");

        assert_eq!(value["messageType"], "HelloBack");
        assert_eq!(value["allowed"], false);
    }

    #[test]
    fn test_decode_hello() {
        let text = r#"{"messageType":"Hello","guid":"g-1","timestamp":5,"version":"0.1.0"}"#;
        let message = Message::decode(text).expect("decode");

        assert_eq!(message.guid, Guid::new("g-1"));
        assert_eq!(message.timestamp, 5);
        assert_eq!(
            message.body,
            Body::Hello {
                version: "0.1.0".into()
            }
        );
    }

    #[test]
    fn test_decode_field_order_independent() {
        let text = r#"{"timestamp":9,"version":"1.0","guid":"g","messageType":"Hello"}"#;
        let message = Message::decode(text).expect("decode");
        assert_eq!(message.message_type(), MessageType::Hello);
    }

    #[test]
    fn test_decode_ping() {
        let text = r#"{"messageType":"Ping","guid":"p","timestamp":1}"#;
        let message = Message::decode(text).expect("decode");
        assert_eq!(message.body, Body::Ping);
    }

    #[test]
    fn test_decode_result_with_payload() {
        let text = r#"{
            "messageType": "Result",
            "guid": "tx-1",
            "timestamp": 1,
            "success": true,
            "payload": {"spawned": 3}
        }"#;
        let message = Message::decode(text).expect("decode");

        let Body::Result(result) = message.body else {
            panic!("expected result body");
        };
        assert!(result.success);
        assert_eq!(
            result.payload.and_then(|p| p.get("spawned").and_then(Value::as_u64)),
            Some(3)
        );
    }

    #[test]
    fn test_decode_ingame_state() {
        let text = r#"{"messageType":"IngameStateChanged","guid":"i","timestamp":1,"ingame":true}"#;
        let message = Message::decode(text).expect("decode");
        assert_eq!(message.body, Body::IngameStateChanged { ingame: true });
    }

    #[test]
    fn test_decode_unknown_type() {
        let text = r#"{"messageType":"Dance","guid":"d","timestamp":1}"#;
        let err = Message::decode(text).unwrap_err();
        assert!(matches!(err, Error::UnknownMessageType { ref message_type } if message_type == "Dance"));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            Message::decode("not json").unwrap_err(),
            Error::Parse { .. }
        ));
        assert!(matches!(
            Message::decode(r#"{"guid":"x","timestamp":1}"#).unwrap_err(),
            Error::Parse { .. }
        ));
        assert!(matches!(
            Message::decode(r#"{"messageType":"Hello","guid":"x","timestamp":1}"#).unwrap_err(),
            Error::Parse { .. }
        ));
    }

    #[test]
    fn test_redeem_uses_transaction_id() {
        let mut args = BTreeMap::new();
        args.insert("count".to_string(), "3".to_string());
        let cart = Cart {
            id: "spawn_enemy".into(),
            sku: "bits100".into(),
            args,
        };

        let message = Message::redeem(
            Guid::new("tx-1"),
            RedeemSource::Viewer,
            &sample_redeem(None),
            &cart,
            &sample_user(),
        );
        let value: Value = serde_json::from_str(&message.encode().expect("encode")).expect("json");

        assert_eq!(value["messageType"], "Redeem");
        assert_eq!(value["guid"], "tx-1");
        assert_eq!(value["command"], "spawn_enemy");
        assert_eq!(value["title"], "Spawn Enemy");
        assert_eq!(value["announce"], true);
        assert_eq!(value["args"]["count"], "3");
        assert_eq!(value["user"]["login"], "viewer");
    }

    #[test]
    fn test_redeem_respects_announce_flag() {
        let message = Message::redeem(
            Guid::new("tx-2"),
            RedeemSource::Viewer,
            &sample_redeem(Some(false)),
            &Cart::default(),
            &sample_user(),
        );

        let Body::Redeem(body) = message.body else {
            panic!("expected redeem body");
        };
        assert!(!body.announce);
    }

    #[test]
    fn test_duration_millis_saturates() {
        assert_eq!(duration_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_millis(Duration::ZERO), 0);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }
}
