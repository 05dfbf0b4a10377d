/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Scoped ownership of a ticket's turn.

use super::core::Sequencer;
use super::ticket::Ticket;
use std::fmt;

/// Proof that a ticket is the active minimum of its [`Sequencer`].
///
/// Returned by the `acquire` family. Dropping the guard releases the ticket
/// and wakes every waiter, so the turn is handed on along every exit path:
/// normal completion, early return, `?` propagation and unwinding.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::sequencer::Sequencer;
///
/// let sequencer = Sequencer::new();
/// let ticket = sequencer.issue();
/// {
///     let guard = sequencer.acquire(ticket).unwrap();
///     assert_eq!(guard.ticket(), ticket);
/// }
/// assert!(sequencer.is_idle());
/// ```
#[must_use = "dropping the guard releases the ticket immediately"]
pub struct TicketGuard<'a> {
    sequencer: &'a Sequencer,
    ticket: Ticket,
}

impl<'a> TicketGuard<'a> {
    pub(crate) fn new(sequencer: &'a Sequencer, ticket: Ticket) -> Self {
        Self { sequencer, ticket }
    }

    /// The ticket whose turn this guard holds.
    #[inline]
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// The sequencer the ticket belongs to.
    #[inline]
    #[must_use]
    pub fn sequencer(&self) -> &'a Sequencer {
        self.sequencer
    }

    /// Releases the ticket now. Equivalent to dropping the guard.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        self.sequencer.release_ticket(self.ticket);
    }
}

impl fmt::Debug for TicketGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketGuard")
            .field("sequencer", &self.sequencer.name())
            .field("ticket", &self.ticket)
            .finish()
    }
}
