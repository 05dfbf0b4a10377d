/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Operation executor.
//!
//! [`Executor::submit`] takes a ticket synchronously, on the caller's
//! thread, then hands the action to a [`Spawner`]. The spawned job waits for
//! its turn, runs the action under a [`TicketGuard`], reports the outcome to
//! listeners while the turn is still held, and releases the ticket on every
//! exit path.

use super::config::SequencerConfig;
use super::core::Sequencer;
use super::error::{OperationError, SequencerError};
use super::event::{OperationOutcome, SequencerEvent};
use super::guard::TicketGuard;
use super::receipt::OperationReceipt;
use super::spawner::{Spawner, ThreadSpawner};
use super::ticket::Ticket;
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, debug_span, warn};
use uuid::Uuid;

/// Type alias for event listener functions.
type EventListener = Arc<dyn Fn(&SequencerEvent) + Send + Sync>;

/// Runs submitted actions concurrently while applying them in submission order.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use ticket_sequencer::sequencer::Executor;
///
/// let executor = Executor::default();
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let handles: Vec<_> = (0..3)
///     .map(|i| {
///         let log = Arc::clone(&log);
///         executor.submit(move || {
///             log.lock().unwrap().push(i);
///             Ok::<_, String>(i)
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     assert!(handle.wait().is_success());
/// }
/// assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
/// ```
pub struct Executor<S: Spawner = ThreadSpawner> {
    sequencer: Arc<Sequencer>,
    spawner: S,
    listeners: Vec<EventListener>,
    acquire_timeout: Option<Duration>,
    thread_name_prefix: String,
}

impl Executor<ThreadSpawner> {
    /// Creates an executor with its own sequencer, spawning one thread per
    /// operation.
    #[must_use]
    pub fn new(config: &SequencerConfig) -> Self {
        Self::with_spawner(config, ThreadSpawner)
    }
}

impl Default for Executor<ThreadSpawner> {
    fn default() -> Self {
        Self::new(&SequencerConfig::default())
    }
}

impl<S: Spawner> Executor<S> {
    /// Creates an executor with its own sequencer and the given spawner.
    #[must_use]
    pub fn with_spawner(config: &SequencerConfig, spawner: S) -> Self {
        Self::with_sequencer(Arc::new(Sequencer::with_config(config)), config, spawner)
    }

    /// Creates an executor that shares an existing sequencer.
    ///
    /// Every operation touching the resource the sequencer guards must go
    /// through the same sequencer instance.
    #[must_use]
    pub fn with_sequencer(sequencer: Arc<Sequencer>, config: &SequencerConfig, spawner: S) -> Self {
        Self {
            sequencer,
            spawner,
            listeners: Vec::new(),
            acquire_timeout: config.acquire_timeout(),
            thread_name_prefix: config.thread_name_prefix.clone(),
        }
    }

    /// Registers an event listener.
    ///
    /// Listeners are called on the operation's thread. Events for operations
    /// that ran their action are delivered before the ticket is released,
    /// hence in ticket order.
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: Fn(&SequencerEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// The sequencer ordering this executor's operations.
    #[must_use]
    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    /// Submits an action.
    ///
    /// The ticket is taken before this method returns; the action runs later
    /// on its own execution context, once every earlier ticket has finished.
    pub fn submit<R, E, F>(&self, action: F) -> OperationHandle<R, E>
    where
        F: FnOnce() -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: Display + Send + 'static,
    {
        self.submit_prepared(|| Ok(()), move |()| action())
    }

    /// Submits an action preceded by a preparation step.
    ///
    /// `prepare` runs on the operation's context *before* it waits for its
    /// turn, so slow work that does not touch shared state (authentication,
    /// validation) overlaps across operations. Its output is passed to
    /// `action`. If `prepare` fails or panics the ticket is withdrawn and the
    /// action never runs.
    pub fn submit_prepared<C, R, E, P, F>(&self, prepare: P, action: F) -> OperationHandle<R, E>
    where
        P: FnOnce() -> Result<C, E> + Send + 'static,
        F: FnOnce(C) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: Display + Send + 'static,
    {
        let ticket = self.sequencer.issue();
        let operation_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        let job = OperationJob {
            sequencer: Arc::clone(&self.sequencer),
            listeners: self.listeners.clone(),
            ticket,
            operation_id,
            acquire_timeout: self.acquire_timeout,
        };
        let name = format!("{}-{}", self.thread_name_prefix, ticket.value());

        let spawned = self.spawner.spawn(
            name,
            Box::new(move || {
                let receipt = job.run(prepare, action);
                // The submitter may have dropped its handle.
                let _ = tx.send(receipt);
            }),
        );

        let receiver = match spawned {
            Ok(()) => rx,
            Err(e) => {
                self.sequencer.withdraw(ticket);
                warn!(
                    sequencer = %self.sequencer.name(),
                    %ticket,
                    %operation_id,
                    error = %e,
                    "failed to spawn operation; ticket withdrawn"
                );
                let (tx, rx) = oneshot::channel();
                let _ = tx.send(OperationReceipt::new(
                    ticket,
                    operation_id,
                    Err(OperationError::Spawn(e)),
                ));
                rx
            }
        };

        OperationHandle {
            sequencer: Arc::clone(&self.sequencer),
            ticket,
            operation_id,
            receiver,
        }
    }
}

/// Everything a spawned operation needs, moved onto its execution context.
struct OperationJob {
    sequencer: Arc<Sequencer>,
    listeners: Vec<EventListener>,
    ticket: Ticket,
    operation_id: Uuid,
    acquire_timeout: Option<Duration>,
}

impl OperationJob {
    fn run<C, R, E, P, F>(self, prepare: P, action: F) -> OperationReceipt<R, E>
    where
        P: FnOnce() -> Result<C, E>,
        F: FnOnce(C) -> Result<R, E>,
        E: Display,
    {
        let span = debug_span!(
            "operation",
            sequencer = %self.sequencer.name(),
            ticket = %self.ticket,
            operation_id = %self.operation_id
        );
        let _entered = span.enter();
        let result = self.execute(prepare, action);
        OperationReceipt::new(self.ticket, self.operation_id, result)
    }

    fn execute<C, R, E, P, F>(&self, prepare: P, action: F) -> Result<R, OperationError<E>>
    where
        P: FnOnce() -> Result<C, E>,
        F: FnOnce(C) -> Result<R, E>,
        E: Display,
    {
        let context = match panic::catch_unwind(AssertUnwindSafe(prepare)) {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => {
                self.withdraw(format!("preparation failed: {e}"));
                return Err(OperationError::Action(e));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.withdraw(format!("preparation panicked: {message}"));
                return Err(OperationError::Panicked { message });
            }
        };

        let guard = match panic::catch_unwind(AssertUnwindSafe(move || self.acquire())) {
            Ok(Ok(guard)) => guard,
            Ok(Err(e)) => {
                self.emit(OperationOutcome::Withdrawn {
                    reason: e.to_string(),
                });
                return Err(OperationError::Sequencer(e));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.withdraw(format!("acquire panicked: {message}"));
                return Err(OperationError::Panicked { message });
            }
        };

        let (outcome, result) = match panic::catch_unwind(AssertUnwindSafe(move || action(context)))
        {
            Ok(Ok(value)) => (OperationOutcome::Completed, Ok(value)),
            Ok(Err(e)) => (
                OperationOutcome::Failed {
                    reason: e.to_string(),
                },
                Err(OperationError::Action(e)),
            ),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%message, "operation panicked while holding its turn");
                (
                    OperationOutcome::Panicked {
                        message: message.clone(),
                    },
                    Err(OperationError::Panicked { message }),
                )
            }
        };

        self.emit(outcome);
        drop(guard);
        result
    }

    fn acquire(&self) -> Result<TicketGuard<'_>, SequencerError> {
        match self.acquire_timeout {
            Some(timeout) => self.sequencer.acquire_timeout(self.ticket, timeout),
            None => self.sequencer.acquire(self.ticket),
        }
    }

    fn withdraw(&self, reason: String) {
        self.sequencer.withdraw(self.ticket);
        warn!(%reason, "operation ended before its turn; ticket withdrawn");
        self.emit(OperationOutcome::Withdrawn { reason });
    }

    fn emit(&self, outcome: OperationOutcome) {
        debug!(?outcome, "operation finished");
        if self.listeners.is_empty() {
            return;
        }
        let event = SequencerEvent::new(self.ticket, self.operation_id, nanos_since_epoch(), outcome);
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

/// Handle to a submitted operation.
///
/// Dropping the handle does not cancel the operation.
#[must_use = "an operation's result is only observable through its handle"]
pub struct OperationHandle<R, E> {
    sequencer: Arc<Sequencer>,
    ticket: Ticket,
    operation_id: Uuid,
    receiver: oneshot::Receiver<OperationReceipt<R, E>>,
}

impl<R, E> OperationHandle<R, E> {
    /// The ticket assigned at submission.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Identifier of the operation.
    #[must_use]
    pub fn operation_id(&self) -> Uuid {
        self.operation_id
    }

    /// Cancels the operation if it has not taken its turn yet.
    ///
    /// Returns `true` if the ticket was cancelled; the handle then resolves
    /// to [`SequencerError::Cancelled`]. Returns `false` if the action is
    /// already running or has finished.
    pub fn cancel(&self) -> bool {
        self.sequencer.cancel(self.ticket)
    }

    /// Blocks the calling thread until the operation, including its release,
    /// has finished.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context; use
    /// [`wait_async`](Self::wait_async) there.
    pub fn wait(self) -> OperationReceipt<R, E> {
        let Self {
            ticket,
            operation_id,
            receiver,
            ..
        } = self;
        receiver
            .blocking_recv()
            .unwrap_or_else(|_| OperationReceipt::new(ticket, operation_id, Err(OperationError::Lost)))
    }

    /// Waits for the operation without blocking the executor thread.
    pub async fn wait_async(self) -> OperationReceipt<R, E> {
        let Self {
            ticket,
            operation_id,
            receiver,
            ..
        } = self;
        receiver
            .await
            .unwrap_or_else(|_| OperationReceipt::new(ticket, operation_id, Err(OperationError::Lost)))
    }
}

impl<R, E> std::fmt::Debug for OperationHandle<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationHandle")
            .field("ticket", &self.ticket)
            .field("operation_id", &self.operation_id)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Returns the current time in nanoseconds since the Unix epoch.
#[inline]
fn nanos_since_epoch() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
