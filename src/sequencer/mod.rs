/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Sequencer module for submission-order execution of concurrent operations.
//!
//! Each operation receives a ticket when it is submitted, before its thread
//! is even scheduled. Its thread then waits until that ticket is the smallest
//! one still outstanding, runs, and releases the ticket, waking every other
//! waiter so the next ticket can go.
//!
//! # Architecture
//!
//! - [`TicketSource`] issues strictly increasing [`Ticket`]s
//! - [`Sequencer`] keeps the outstanding tickets in a min-ordered set behind a
//!   mutex with a condition variable, broadcasting on every release
//! - [`TicketGuard`] releases its ticket on drop, on every exit path
//! - [`Executor`] takes a ticket per submitted action, spawns the action via a
//!   [`Spawner`], and reports through an [`OperationHandle`]
//! - Events are emitted to registered listeners in ticket order
//!
//! # Examples
//!
//! ```
//! use ticket_sequencer::sequencer::{Executor, SequencerConfig};
//!
//! let mut executor = Executor::new(&SequencerConfig::default());
//!
//! // Register an event listener
//! executor.add_listener(|event| {
//!     println!("Event {}: {:?}", event.ticket, event.outcome);
//! });
//!
//! let handle = executor.submit(|| Ok::<_, String>("applied"));
//! let receipt = handle.wait();
//! assert_eq!(receipt.into_result().unwrap(), "applied");
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod event;
pub mod executor;
pub mod guard;
pub mod receipt;
pub mod spawner;
pub mod ticket;

#[cfg(test)]
mod tests;

// Re-export main types
pub use config::SequencerConfig;
pub use self::core::Sequencer;
pub use error::{OperationError, SequencerError};
pub use event::{OperationOutcome, SequencerEvent};
pub use executor::{Executor, OperationHandle};
pub use guard::TicketGuard;
pub use receipt::OperationReceipt;
pub use spawner::{Job, Spawner, ThreadSpawner, TokioBlockingSpawner};
pub use ticket::{Ticket, TicketSource, TicketState};
