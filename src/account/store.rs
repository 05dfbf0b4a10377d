/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Shared state guarded by a sequencer.

use std::sync::atomic::{AtomicI64, Ordering};

/// A value read and written only by the operation holding the turn.
///
/// Implementations need no locking of their own: the sequencer guarantees a
/// single writer at a time and the lock hand-off between turns orders the
/// accesses.
pub trait SharedResource: Send + Sync {
    /// The stored value.
    type Value;

    /// Reads the current value.
    fn read(&self) -> Self::Value;

    /// Replaces the current value.
    fn write(&self, value: Self::Value);
}

/// An account balance.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::account::{BalanceStore, SharedResource};
///
/// let store = BalanceStore::new(100);
/// store.write(store.read() + 50);
/// assert_eq!(store.read(), 150);
/// ```
#[derive(Debug, Default)]
pub struct BalanceStore {
    balance: AtomicI64,
}

impl BalanceStore {
    /// Creates a store holding `opening`.
    #[must_use]
    pub fn new(opening: i64) -> Self {
        Self {
            balance: AtomicI64::new(opening),
        }
    }
}

impl SharedResource for BalanceStore {
    type Value = i64;

    #[inline]
    fn read(&self) -> i64 {
        self.balance.load(Ordering::Relaxed)
    }

    #[inline]
    fn write(&self, value: i64) {
        self.balance.store(value, Ordering::Relaxed);
    }
}
