/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! # ticket-sequencer
//!
//! A mutual-exclusion primitive that applies concurrently running operations
//! in the order they were *submitted*, not the order their threads happen to
//! be scheduled.
//!
//! Submitting an operation takes a ticket on the caller's thread. The
//! operation's own thread later blocks until its ticket is the smallest one
//! still outstanding, touches the shared state, and releases the ticket on
//! every exit path. Failures, panics, timeouts and cancellations all hand the
//! turn on to the next ticket.
//!
//! ## Modules
//!
//! - [`sequencer`]: tickets, the [`Sequencer`], the scoped [`TicketGuard`],
//!   and the [`Executor`] that spawns operations and reports their outcome.
//! - [`account`]: a bank account whose deposits and withdrawals each run on
//!   their own thread yet apply in request order.
//! - [`config`]: JSON configuration loading and validation.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use ticket_sequencer::Executor;
//!
//! let executor = Executor::default();
//! let applied = Arc::new(Mutex::new(Vec::new()));
//!
//! let handles: Vec<_> = [30u64, 10, 20]
//!     .into_iter()
//!     .map(|delay_ms| {
//!         let applied = Arc::clone(&applied);
//!         executor.submit_prepared(
//!             // Runs before the turn: later submissions may finish this first.
//!             move || {
//!                 std::thread::sleep(Duration::from_millis(delay_ms));
//!                 Ok::<_, String>(delay_ms)
//!             },
//!             move |delay_ms| {
//!                 applied.lock().unwrap().push(delay_ms);
//!                 Ok(())
//!             },
//!         )
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.wait().into_result().unwrap();
//! }
//! assert_eq!(*applied.lock().unwrap(), vec![30, 10, 20]);
//! ```

pub mod account;
pub mod config;
pub mod sequencer;

pub use account::{Account, AccountConfig, AccountError};
pub use config::ConfigError;
pub use sequencer::{
    Executor, OperationError, OperationHandle, OperationReceipt, Sequencer, SequencerConfig,
    SequencerError, Ticket, TicketGuard,
};
