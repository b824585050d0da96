//! Redeem correlation tracker.
//!
//! Pairs every in-flight redeem with the channel its caller is waiting on.
//! Two maps share the transaction id as key:
//!
//! - outstanding: the `Redeem` message that was sent (duplicate guard)
//! - handlers: single-shot result channel back to the caller
//!
//! Entries are created and removed together. The tracker is owned by the
//! connection event loop and is never shared, so it needs no locking.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::identifiers::Guid;
use crate::protocol::{Message, RedeemResult};

// ============================================================================
// Types
// ============================================================================

/// Single-shot channel settling a caller's redeem.
pub type ResultHandler = oneshot::Sender<Result<RedeemResult>>;

// ============================================================================
// RedeemTracker
// ============================================================================

/// Maps in-flight transaction ids to their redeem and result handler.
#[derive(Debug, Default)]
pub struct RedeemTracker {
    /// Redeem messages awaiting a result.
    outstanding: FxHashMap<Guid, Message>,
    /// Callers awaiting a result.
    handlers: FxHashMap<Guid, ResultHandler>,
}

impl RedeemTracker {
    /// Creates an empty tracker.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a redeem and the handler awaiting its result.
    ///
    /// An existing entry whose caller has stopped waiting is replaced.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingTransactionId`] if the message guid is blank
    /// - [`Error::DuplicateRedeem`] if the guid is already outstanding
    pub fn register(&mut self, message: Message, handler: ResultHandler) -> Result<()> {
        if message.guid.is_blank() {
            return Err(Error::MissingTransactionId);
        }

        let in_progress = self
            .handlers
            .get(&message.guid)
            .is_some_and(|handler| !handler.is_closed());

        if in_progress {
            return Err(Error::duplicate_redeem(message.guid));
        }

        self.handlers.insert(message.guid.clone(), handler);
        self.outstanding.insert(message.guid.clone(), message);
        Ok(())
    }

    /// Settles the redeem a result belongs to.
    ///
    /// Returns `false` if the guid is not tracked (late, duplicate or
    /// unsolicited result).
    pub fn resolve(&mut self, result: RedeemResult) -> bool {
        self.outstanding.remove(&result.guid);

        match self.handlers.remove(&result.guid) {
            Some(handler) => {
                // Receiver may have timed out in the same instant.
                let _ = handler.send(Ok(result));
                true
            }
            None => false,
        }
    }

    /// Forgets a redeem whose caller stopped waiting.
    ///
    /// Only removes the entry if its handler is closed, so a fresh
    /// registration under the same guid is never dropped. Returns `true`
    /// if an entry was removed.
    pub fn abandon(&mut self, guid: &Guid) -> bool {
        let closed = self
            .handlers
            .get(guid)
            .is_some_and(|handler| handler.is_closed());

        if closed {
            self.handlers.remove(guid);
            self.outstanding.remove(guid);
        }

        closed
    }

    /// Fails every pending redeem with errors produced by `error`.
    ///
    /// Returns the number of redeems failed.
    pub fn fail_all(&mut self, error: impl Fn() -> Error) -> usize {
        self.outstanding.clear();

        let pending: Vec<_> = self.handlers.drain().collect();
        let count = pending.len();

        for (_, handler) in pending {
            let _ = handler.send(Err(error()));
        }

        count
    }

    /// Returns `true` if the guid has an outstanding redeem.
    #[inline]
    #[must_use]
    pub fn contains(&self, guid: &Guid) -> bool {
        self.outstanding.contains_key(guid)
    }

    /// Returns the number of outstanding redeems.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    /// Returns `true` if nothing is outstanding.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
