/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Operation receipt types.
//!
//! This module defines the receipt returned to callers when they wait on an
//! [`OperationHandle`](super::OperationHandle).

use super::error::OperationError;
use super::ticket::Ticket;
use uuid::Uuid;

/// Receipt for a finished operation.
///
/// Contains the ticket the operation was submitted with and the result of
/// running it.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::sequencer::{OperationReceipt, Ticket};
/// use uuid::Uuid;
///
/// let receipt: OperationReceipt<u32, String> =
///     OperationReceipt::new(Ticket::new(42), Uuid::new_v4(), Ok(7));
/// assert_eq!(receipt.ticket.value(), 42);
/// assert!(receipt.is_success());
/// ```
#[derive(Debug)]
pub struct OperationReceipt<R, E> {
    /// The ticket assigned at submission.
    pub ticket: Ticket,

    /// Identifier of the operation.
    pub operation_id: Uuid,

    /// The result of running the operation.
    pub result: Result<R, OperationError<E>>,
}

impl<R, E> OperationReceipt<R, E> {
    /// Creates a new receipt.
    #[must_use]
    pub fn new(ticket: Ticket, operation_id: Uuid, result: Result<R, OperationError<E>>) -> Self {
        Self {
            ticket,
            operation_id,
            result,
        }
    }

    /// Returns `true` if the operation succeeded.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Consumes the receipt, returning the operation's result.
    ///
    /// # Errors
    ///
    /// Returns the [`OperationError`] the operation ended with.
    pub fn into_result(self) -> Result<R, OperationError<E>> {
        self.result
    }
}
