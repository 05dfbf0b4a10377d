/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Core Sequencer implementation.
//!
//! The [`Sequencer`] keeps every outstanding ticket in a min-ordered set
//! guarded by one mutex. A ticket may run only while it is the minimum of
//! that set; each release or withdrawal broadcasts to all waiters, which
//! re-check their own position and either proceed or go back to sleep.

use super::config::SequencerConfig;
use super::error::SequencerError;
use super::guard::TicketGuard;
use super::ticket::{Ticket, TicketSource, TicketState};
use std::collections::{BTreeSet, HashSet};
use std::pin::pin;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

/// Everything protected by the sequencer lock.
#[derive(Debug, Default)]
struct SequencerState {
    /// Tickets submitted but not yet released or withdrawn.
    outstanding: BTreeSet<Ticket>,
    /// Tickets whose owners are blocked in `acquire`.
    waiting: BTreeSet<Ticket>,
    /// Tickets removed by `cancel` whose owners have not observed it yet.
    cancelled: HashSet<Ticket>,
    /// The ticket currently holding the turn.
    active: Option<Ticket>,
    /// Highest ticket that has ever taken its turn. Nothing at or below it
    /// may be registered again.
    last_acquired: Option<Ticket>,
}

impl SequencerState {
    fn min(&self) -> Option<Ticket> {
        self.outstanding.first().copied()
    }
}

/// Orders operations by the ticket they were given at submission time.
///
/// Tickets are registered by the submitting context, before the operation is
/// scheduled; an operation's own thread later calls [`acquire`](Self::acquire)
/// and blocks until its ticket is the smallest outstanding one. The returned
/// [`TicketGuard`] hands the turn on when dropped.
///
/// The mutex is held only while the outstanding set is inspected or changed,
/// never while the caller's action runs.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use ticket_sequencer::sequencer::Sequencer;
///
/// let sequencer = Arc::new(Sequencer::new());
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let tickets: Vec<_> = (0..4).map(|_| sequencer.issue()).collect();
/// let handles: Vec<_> = tickets
///     .into_iter()
///     .rev()
///     .map(|ticket| {
///         let sequencer = Arc::clone(&sequencer);
///         let log = Arc::clone(&log);
///         std::thread::spawn(move || {
///             let _turn = sequencer.acquire(ticket).unwrap();
///             log.lock().unwrap().push(ticket.value());
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(*log.lock().unwrap(), vec![1, 2, 3, 4]);
/// ```
#[derive(Debug)]
pub struct Sequencer {
    name: String,
    tickets: TicketSource,
    state: Mutex<SequencerState>,
    /// Wakes threads blocked in the synchronous acquire paths.
    turn: Condvar,
    /// Wakes tasks awaiting in `acquire_async`.
    notify: Notify,
}

impl Sequencer {
    /// Creates a sequencer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&SequencerConfig::default())
    }

    /// Creates a sequencer from `config`.
    ///
    /// Only `name` and `first_ticket` are relevant here; the remaining
    /// fields are consumed by the [`Executor`](super::Executor).
    #[must_use]
    pub fn with_config(config: &SequencerConfig) -> Self {
        Self {
            name: config.name.clone(),
            tickets: TicketSource::starting_at(config.first_ticket),
            state: Mutex::new(SequencerState::default()),
            turn: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Name used in log output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Draws the next ticket and registers it in one critical section.
    ///
    /// Because both steps happen under the lock, the order of `issue` calls
    /// is exactly the order in which the tickets will run.
    pub fn issue(&self) -> Ticket {
        let mut state = self.lock();
        let ticket = self.tickets.next();
        state.outstanding.insert(ticket);
        debug!(sequencer = %self.name, %ticket, "ticket issued");
        ticket
    }

    /// Registers a ticket minted elsewhere.
    ///
    /// Later calls to [`issue`](Self::issue) will return tickets greater than
    /// `ticket`.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::DuplicateTicket`] if the ticket is already outstanding
    /// - [`SequencerError::StaleTicket`] if a ticket at or above it has already
    ///   taken its turn, whether or not one is active right now
    pub fn register(&self, ticket: Ticket) -> Result<(), SequencerError> {
        let mut state = self.lock();
        if let Some(last_acquired) = state.last_acquired.filter(|last| ticket <= *last) {
            return Err(SequencerError::StaleTicket {
                ticket,
                last_acquired,
            });
        }
        if !state.outstanding.insert(ticket) {
            return Err(SequencerError::DuplicateTicket { ticket });
        }
        state.cancelled.remove(&ticket);
        self.tickets.advance_past(ticket);
        debug!(sequencer = %self.name, %ticket, "ticket registered");
        Ok(())
    }

    /// Blocks until `ticket` is the smallest outstanding ticket.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::UnknownTicket`] if the ticket is not outstanding
    /// - [`SequencerError::Cancelled`] if the ticket was cancelled before its turn
    pub fn acquire(&self, ticket: Ticket) -> Result<TicketGuard<'_>, SequencerError> {
        let mut state = self.lock();
        loop {
            if self.poll_turn(&mut state, ticket)? {
                return Ok(TicketGuard::new(self, ticket));
            }
            state = self
                .turn
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`acquire`](Self::acquire), but gives up after `timeout`.
    ///
    /// On expiry the ticket is withdrawn so that later tickets are not held
    /// back by it.
    ///
    /// # Errors
    ///
    /// Same as [`acquire`](Self::acquire), plus
    /// [`SequencerError::AcquireTimeout`] when the deadline passes.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn acquire_timeout(
        &self,
        ticket: Ticket,
        timeout: Duration,
    ) -> Result<TicketGuard<'_>, SequencerError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.acquire(ticket);
        };
        let mut state = self.lock();
        loop {
            if self.poll_turn(&mut state, ticket)? {
                return Ok(TicketGuard::new(self, ticket));
            }
            let now = Instant::now();
            if now >= deadline {
                self.withdraw_locked(&mut state, ticket);
                warn!(sequencer = %self.name, %ticket, ?timeout, "acquire timed out");
                return Err(SequencerError::AcquireTimeout {
                    ticket,
                    waited: timeout,
                });
            }
            let (guard, _) = self
                .turn
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Async counterpart of [`acquire`](Self::acquire) for tokio tasks.
    ///
    /// Dropping the future before it resolves withdraws the ticket, so a
    /// `tokio::time::timeout` or `select!` around this call never strands
    /// later tickets.
    ///
    /// # Errors
    ///
    /// Same as [`acquire`](Self::acquire).
    pub async fn acquire_async(&self, ticket: Ticket) -> Result<TicketGuard<'_>, SequencerError> {
        let mut pending = PendingAcquire {
            sequencer: self,
            ticket,
            armed: true,
        };
        loop {
            let mut notified = pin!(self.notify.notified());
            notified.as_mut().enable();

            let ready = {
                let mut state = self.lock();
                self.poll_turn(&mut state, ticket)
            };
            match ready {
                Ok(true) => {
                    pending.armed = false;
                    return Ok(TicketGuard::new(self, ticket));
                }
                Ok(false) => notified.await,
                Err(e) => {
                    pending.armed = false;
                    return Err(e);
                }
            }
        }
    }

    /// Cancels a ticket that has not taken its turn yet.
    ///
    /// The ticket leaves the outstanding set immediately and every waiter is
    /// woken; the owner's `acquire` then fails with
    /// [`SequencerError::Cancelled`]. Returns `false` if the ticket is active
    /// or not outstanding.
    ///
    /// The cancellation is remembered until the owner observes it through
    /// [`acquire`](Self::acquire) (or one of its variants) or clears it with
    /// [`withdraw`](Self::withdraw). Operations run by an
    /// [`Executor`](super::Executor) always do one of the two; callers driving
    /// tickets by hand must do the same.
    pub fn cancel(&self, ticket: Ticket) -> bool {
        let mut state = self.lock();
        if state.active == Some(ticket) || !state.outstanding.remove(&ticket) {
            return false;
        }
        state.cancelled.insert(ticket);
        self.wake_all();
        debug!(sequencer = %self.name, %ticket, "ticket cancelled");
        true
    }

    /// Removes a ticket that has not taken its turn yet, wherever it sits in
    /// the order, and wakes all waiters.
    ///
    /// This is the completion path for operations that end before acquiring
    /// (failed preparation, timeout, cancellation). Returns `false` if the
    /// ticket is active or unknown.
    pub fn withdraw(&self, ticket: Ticket) -> bool {
        let mut state = self.lock();
        self.withdraw_locked(&mut state, ticket)
    }

    /// Blocks until no ticket is outstanding.
    pub fn wait_idle(&self) {
        let mut state = self.lock();
        while !state.outstanding.is_empty() {
            state = self
                .turn
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until no ticket is outstanding or `timeout` elapses.
    ///
    /// Returns `true` if the sequencer became idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_idle();
            return true;
        };
        let mut state = self.lock();
        while !state.outstanding.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .turn
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        true
    }

    /// Snapshot of the outstanding tickets, smallest first.
    #[must_use]
    pub fn outstanding(&self) -> Vec<Ticket> {
        self.lock().outstanding.iter().copied().collect()
    }

    /// The smallest outstanding ticket.
    #[must_use]
    pub fn min_ticket(&self) -> Option<Ticket> {
        self.lock().min()
    }

    /// The ticket currently holding the turn.
    #[must_use]
    pub fn active_ticket(&self) -> Option<Ticket> {
        self.lock().active
    }

    /// Returns `true` if no ticket is outstanding.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.lock().outstanding.is_empty()
    }

    /// Current lifecycle state of `ticket`.
    #[must_use]
    pub fn state_of(&self, ticket: Ticket) -> TicketState {
        let state = self.lock();
        if state.active == Some(ticket) {
            TicketState::Active
        } else if state.waiting.contains(&ticket) {
            TicketState::Waiting
        } else if state.outstanding.contains(&ticket) {
            TicketState::Created
        } else {
            TicketState::Released
        }
    }

    /// Removes the active ticket and wakes every waiter.
    ///
    /// # Panics
    ///
    /// Panics if `ticket` is not both the active ticket and the minimum of
    /// the outstanding set. Only a [`TicketGuard`] calls this, and a guard
    /// exists only for the ticket that passed `acquire`.
    pub(crate) fn release_ticket(&self, ticket: Ticket) {
        let mut state = self.lock();
        assert_eq!(
            state.active,
            Some(ticket),
            "sequencer `{}`: released ticket {ticket} does not hold the turn",
            self.name
        );
        assert_eq!(
            state.min(),
            Some(ticket),
            "sequencer `{}`: released ticket {ticket} is not the minimum outstanding ticket",
            self.name
        );
        state.outstanding.remove(&ticket);
        state.active = None;
        self.wake_all();
        debug!(sequencer = %self.name, %ticket, "ticket released");
    }

    /// Releases the ticket held by `guard`.
    ///
    /// # Panics
    ///
    /// Panics if the guard was issued by a different sequencer.
    pub fn release(&self, guard: TicketGuard<'_>) {
        assert!(
            std::ptr::eq(self, guard.sequencer()),
            "sequencer `{}`: guard for ticket {} belongs to another sequencer",
            self.name,
            guard.ticket()
        );
        guard.release();
    }

    /// Checks whether `ticket` may run now, marking it active if so.
    ///
    /// Called with the lock held after every wake-up.
    fn poll_turn(
        &self,
        state: &mut SequencerState,
        ticket: Ticket,
    ) -> Result<bool, SequencerError> {
        if state.cancelled.remove(&ticket) {
            state.waiting.remove(&ticket);
            return Err(SequencerError::Cancelled { ticket });
        }
        if !state.outstanding.contains(&ticket) {
            state.waiting.remove(&ticket);
            return Err(SequencerError::UnknownTicket { ticket });
        }
        if state.min() != Some(ticket) {
            if state.waiting.insert(ticket) {
                trace!(sequencer = %self.name, %ticket, "waiting for turn");
            }
            return Ok(false);
        }
        assert!(
            state.active.is_none(),
            "sequencer `{}`: ticket {ticket} reached the front while {:?} is active",
            self.name,
            state.active
        );
        state.waiting.remove(&ticket);
        state.active = Some(ticket);
        state.last_acquired = Some(ticket);
        debug!(sequencer = %self.name, %ticket, "ticket acquired");
        Ok(true)
    }

    fn withdraw_locked(&self, state: &mut SequencerState, ticket: Ticket) -> bool {
        if state.active == Some(ticket) {
            return false;
        }
        let removed = state.outstanding.remove(&ticket);
        let was_cancelled = state.cancelled.remove(&ticket);
        state.waiting.remove(&ticket);
        if removed {
            self.wake_all();
            debug!(sequencer = %self.name, %ticket, "ticket withdrawn");
        }
        removed || was_cancelled
    }

    /// Wakes every waiter; each re-checks whether it is now the minimum.
    fn wake_all(&self) {
        self.turn.notify_all();
        self.notify.notify_waiters();
    }

    fn lock(&self) -> MutexGuard<'_, SequencerState> {
        // State is never left half-updated; poisoning is ignored.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Withdraws the ticket if an `acquire_async` future is dropped mid-wait.
struct PendingAcquire<'a> {
    sequencer: &'a Sequencer,
    ticket: Ticket,
    armed: bool,
}

impl Drop for PendingAcquire<'_> {
    fn drop(&mut self) {
        if self.armed && self.sequencer.withdraw(self.ticket) {
            warn!(
                sequencer = %self.sequencer.name,
                ticket = %self.ticket,
                "async acquire dropped before its turn; ticket withdrawn"
            );
        }
    }
}
