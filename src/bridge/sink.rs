//! In-game status sink.
//!
//! The game reports when the player enters or leaves gameplay. The bridge
//! forwards that to the host, and reports `false` whenever the game socket
//! goes away.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// GameStateSink
// ============================================================================

/// Receiver of the game's in-game status.
///
/// Called from the connection event loop; implementations must not block.
pub trait GameStateSink: Send + Sync {
    /// Records whether the game is currently in gameplay.
    fn set_ingame(&self, ingame: bool);
}

impl<F> GameStateSink for F
where
    F: Fn(bool) + Send + Sync,
{
    fn set_ingame(&self, ingame: bool) {
        self(ingame);
    }
}

// ============================================================================
// IngameFlag
// ============================================================================

/// Shared flag tracking the last reported in-game status.
#[derive(Debug, Clone, Default)]
pub struct IngameFlag {
    inner: Arc<AtomicBool>,
}

impl IngameFlag {
    /// Creates a flag initially `false`.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last reported status.
    #[inline]
    #[must_use]
    pub fn get(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

impl GameStateSink for IngameFlag {
    fn set_ingame(&self, ingame: bool) {
        self.inner.store(ingame, Ordering::SeqCst);
    }
}

// ============================================================================
// Tests
// ============================================================================
