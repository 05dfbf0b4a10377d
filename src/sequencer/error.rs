/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Error types for the sequencer and the operation executor.

use super::ticket::Ticket;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`Sequencer`](super::Sequencer) operations.
///
/// Invariant violations (releasing a ticket that is not the active minimum)
/// are not represented here: they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    /// The ticket is already in the outstanding set.
    #[error("ticket {ticket} is already outstanding")]
    DuplicateTicket {
        /// The rejected ticket.
        ticket: Ticket,
    },

    /// A ticket at or above this one has already taken its turn, so this
    /// one could only run out of order.
    #[error("ticket {ticket} does not follow the last acquired ticket {last_acquired}")]
    StaleTicket {
        /// The rejected ticket.
        ticket: Ticket,
        /// The highest ticket that had taken its turn at registration time.
        last_acquired: Ticket,
    },

    /// The ticket is not outstanding (never registered, or already retired).
    #[error("ticket {ticket} is not outstanding")]
    UnknownTicket {
        /// The ticket that was looked up.
        ticket: Ticket,
    },

    /// The ticket did not reach the front before the deadline and was withdrawn.
    #[error("ticket {ticket} withdrawn after waiting {waited:?} for its turn")]
    AcquireTimeout {
        /// The withdrawn ticket.
        ticket: Ticket,
        /// How long the caller waited.
        waited: Duration,
    },

    /// The ticket was cancelled before it reached the front.
    #[error("ticket {ticket} was cancelled before its turn")]
    Cancelled {
        /// The cancelled ticket.
        ticket: Ticket,
    },
}

impl SequencerError {
    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::DuplicateTicket { .. } => "duplicate_ticket",
            Self::StaleTicket { .. } => "stale_ticket",
            Self::UnknownTicket { .. } => "unknown_ticket",
            Self::AcquireTimeout { .. } => "acquire_timeout",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Returns the ticket the error refers to.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::DuplicateTicket { ticket }
            | Self::StaleTicket { ticket, .. }
            | Self::UnknownTicket { ticket }
            | Self::AcquireTimeout { ticket, .. }
            | Self::Cancelled { ticket } => *ticket,
        }
    }
}

/// Failure of a submitted operation, as reported through its handle.
///
/// Whatever the variant, the operation's ticket has left the outstanding set
/// by the time this error is observable.
#[derive(Debug, Error)]
pub enum OperationError<E> {
    /// The caller's action (or its prepare step) returned an error.
    #[error("operation failed: {0}")]
    Action(E),

    /// The operation never got its turn.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    /// The action panicked while holding its ticket.
    #[error("operation panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// The spawner could not start the operation.
    #[error("failed to spawn operation: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker went away without reporting a result.
    #[error("operation result was lost before completion")]
    Lost,
}

impl<E> OperationError<E> {
    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Action(_) => "action_failed",
            Self::Sequencer(e) => e.as_label(),
            Self::Panicked { .. } => "panicked",
            Self::Spawn(_) => "spawn_failed",
            Self::Lost => "lost",
        }
    }

    /// Returns the domain error if the action itself failed.
    #[must_use]
    pub fn action(&self) -> Option<&E> {
        match self {
            Self::Action(e) => Some(e),
            _ => None,
        }
    }

    /// Consumes the error, returning the domain error if the action failed.
    #[must_use]
    pub fn into_action(self) -> Option<E> {
        match self {
            Self::Action(e) => Some(e),
            _ => None,
        }
    }
}
