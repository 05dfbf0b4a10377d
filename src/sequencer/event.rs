/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Sequencer event types.
//!
//! This module defines the events emitted by the [`Executor`] after each
//! submitted operation finishes.
//!
//! [`Executor`]: super::Executor

use super::ticket::Ticket;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The action ran and succeeded.
    Completed,

    /// The action ran and returned an error.
    Failed {
        /// The error rendered as text.
        reason: String,
    },

    /// The action ran and panicked.
    Panicked {
        /// The panic payload rendered as text.
        message: String,
    },

    /// The operation gave up its ticket without running the action
    /// (failed preparation, timeout or cancellation).
    Withdrawn {
        /// Why the ticket was withdrawn.
        reason: String,
    },
}

impl OperationOutcome {
    /// Returns `true` if the action ran while holding the turn.
    ///
    /// Applied outcomes are emitted before the ticket is released, so
    /// listeners observe them in ticket order.
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Withdrawn { .. })
    }

    /// Returns `true` if the action ran and succeeded.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Event emitted after an operation finishes.
///
/// Contains the ticket, operation id, timestamp and outcome.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::sequencer::{OperationOutcome, SequencerEvent, Ticket};
/// use uuid::Uuid;
///
/// let event = SequencerEvent::new(Ticket::new(1), Uuid::new_v4(), 1234567890, OperationOutcome::Completed);
/// assert_eq!(event.ticket, Ticket::new(1));
/// assert!(event.outcome.is_applied());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerEvent {
    /// Ticket the operation was submitted with.
    pub ticket: Ticket,

    /// Identifier of the submitted operation.
    pub operation_id: Uuid,

    /// Nanosecond timestamp when the operation finished.
    pub timestamp_ns: u64,

    /// How the operation ended.
    pub outcome: OperationOutcome,
}

impl SequencerEvent {
    /// Creates a new sequencer event.
    #[must_use]
    pub fn new(
        ticket: Ticket,
        operation_id: Uuid,
        timestamp_ns: u64,
        outcome: OperationOutcome,
    ) -> Self {
        Self {
            ticket,
            operation_id,
            timestamp_ns,
            outcome,
        }
    }
}
