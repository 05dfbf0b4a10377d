/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Ticket types.
//!
//! A [`Ticket`] is the position an operation takes in the total order at the
//! moment it is submitted. Tickets come from a [`TicketSource`], an atomic
//! counter, so two submissions can never share a value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, totally ordered position of an operation in submission order.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::sequencer::Ticket;
///
/// let first = Ticket::new(1);
/// let second = Ticket::new(2);
/// assert!(first < second);
/// assert_eq!(second.value(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(u64);

impl Ticket {
    /// Wraps a raw sequence value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a ticket as seen by its [`Sequencer`](super::Sequencer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketState {
    /// Registered, owner has not started waiting yet.
    Created,
    /// Owner is blocked inside `acquire`.
    Waiting,
    /// Owner holds the right to touch shared state.
    Active,
    /// No longer outstanding: released, withdrawn, or never registered.
    Released,
}

/// Issues strictly increasing tickets.
///
/// `next` may be called from any number of threads; each call returns a
/// value never returned before.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::sequencer::TicketSource;
///
/// let source = TicketSource::new();
/// let a = source.next();
/// let b = source.next();
/// assert!(a < b);
/// ```
#[derive(Debug)]
pub struct TicketSource {
    next: AtomicU64,
}

impl TicketSource {
    /// Creates a source whose first ticket is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a source whose first ticket is `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Returns the next ticket.
    #[inline]
    pub fn next(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Ensures every ticket issued afterwards is strictly greater than `ticket`.
    pub fn advance_past(&self, ticket: Ticket) {
        self.next
            .fetch_max(ticket.0.saturating_add(1), Ordering::Relaxed);
    }

    /// Returns the value the next call to [`next`](Self::next) would produce.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Ticket {
        Ticket(self.next.load(Ordering::Relaxed))
    }
}

impl Default for TicketSource {
    fn default() -> Self {
        Self::new()
    }
}
