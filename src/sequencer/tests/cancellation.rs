/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Tests for timeout, cancellation and withdrawal paths.

#[cfg(test)]
mod tests {
    use crate::sequencer::{
        Executor, OperationError, OperationOutcome, Sequencer, SequencerConfig, SequencerError,
        TicketState,
    };
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_timeout_withdraws_ticket() {
        let sequencer = Sequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();
        let third = sequencer.issue();

        let guard = sequencer.acquire(first).unwrap();
        let err = sequencer
            .acquire_timeout(second, Duration::from_millis(30))
            .unwrap_err();
        assert!(matches!(err, SequencerError::AcquireTimeout { ticket, .. } if ticket == second));
        assert_eq!(sequencer.outstanding(), vec![first, third]);

        drop(guard);
        let turn = sequencer
            .acquire_timeout(third, Duration::from_millis(100))
            .unwrap();
        assert_eq!(turn.ticket(), third);
    }

    #[test]
    fn test_acquire_timeout_with_unbounded_duration() {
        let sequencer = Sequencer::new();
        let ticket = sequencer.issue();

        let turn = sequencer.acquire_timeout(ticket, Duration::MAX).unwrap();
        assert_eq!(turn.ticket(), ticket);
        drop(turn);
        assert!(sequencer.is_idle());
        assert!(sequencer.wait_idle_timeout(Duration::MAX));
    }

    #[test]
    fn test_unbounded_timeout_still_waits_for_turn() {
        let sequencer = Arc::new(Sequencer::new());
        let first = sequencer.issue();
        let second = sequencer.issue();
        let guard = sequencer.acquire(first).unwrap();

        let waiter = {
            let sequencer = Arc::clone(&sequencer);
            thread::spawn(move || {
                sequencer
                    .acquire_timeout(second, Duration::MAX)
                    .map(|turn| turn.ticket())
            })
        };
        thread::sleep(Duration::from_millis(30));
        assert_eq!(sequencer.state_of(second), TicketState::Waiting);
        drop(guard);

        assert_eq!(waiter.join().unwrap(), Ok(second));
        assert!(sequencer.is_idle());
    }

    #[test]
    fn test_executor_with_maximum_timeout_runs_in_order() {
        let config = SequencerConfig {
            acquire_timeout_ms: Some(u64::MAX),
            ..SequencerConfig::default()
        };
        let executor = Executor::new(&config);
        let applied = Arc::new(Mutex::new(Vec::new()));
        let handles: Vec<_> = (0..3)
            .map(|i| {
                let applied = Arc::clone(&applied);
                executor.submit(move || {
                    applied.lock().unwrap().push(i);
                    Ok::<_, String>(i)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.wait().into_result().unwrap(), i);
        }
        assert_eq!(*applied.lock().unwrap(), vec![0, 1, 2]);
        assert!(executor.sequencer().is_idle());
    }

    #[test]
    fn test_withdraw_clears_unobserved_cancellation() {
        let sequencer = Sequencer::new();
        let ticket = sequencer.issue();
        assert!(sequencer.cancel(ticket));
        assert!(sequencer.is_idle());

        assert!(sequencer.withdraw(ticket));
        assert!(!sequencer.withdraw(ticket));
        assert_eq!(
            sequencer.acquire(ticket).unwrap_err(),
            SequencerError::UnknownTicket { ticket }
        );
    }

    #[test]
    fn test_cancel_waiting_ticket() {
        let sequencer = Arc::new(Sequencer::new());
        let first = sequencer.issue();
        let second = sequencer.issue();
        let third = sequencer.issue();
        let guard = sequencer.acquire(first).unwrap();

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let sequencer = Arc::clone(&sequencer);
            thread::spawn(move || {
                let result = sequencer.acquire(second).map(|turn| turn.ticket());
                tx.send(result).unwrap();
            })
        };

        while sequencer.state_of(second) != TicketState::Waiting {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(sequencer.cancel(second));
        let result = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(result, Err(SequencerError::Cancelled { ticket: second }));
        waiter.join().unwrap();

        drop(guard);
        assert!(sequencer.acquire_timeout(third, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_cancel_created_ticket_unblocks_successor() {
        let sequencer = Sequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();

        assert!(sequencer.cancel(first));
        assert!(!sequencer.cancel(first));
        let turn = sequencer
            .acquire_timeout(second, Duration::from_millis(100))
            .unwrap();
        assert!(!sequencer.cancel(second), "active ticket cannot be cancelled");
        drop(turn);

        assert_eq!(
            sequencer.acquire(first).unwrap_err(),
            SequencerError::Cancelled { ticket: first }
        );
        assert!(sequencer.is_idle());
    }

    #[test]
    fn test_withdraw_is_refused_for_active_ticket() {
        let sequencer = Sequencer::new();
        let ticket = sequencer.issue();
        let guard = sequencer.acquire(ticket).unwrap();
        assert!(!sequencer.withdraw(ticket));
        drop(guard);
        assert!(!sequencer.withdraw(ticket));
    }

    #[test]
    fn test_executor_timeout_reports_and_unblocks() {
        let config = SequencerConfig {
            acquire_timeout_ms: Some(50),
            ..SequencerConfig::default()
        };
        let mut executor = Executor::new(&config);
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let outcomes_clone = outcomes.clone();
        executor.add_listener(move |event| {
            outcomes_clone
                .lock()
                .unwrap()
                .push((event.ticket, event.outcome.clone()));
        });

        let holder = executor.sequencer().issue();
        let guard = executor.sequencer().acquire(holder).unwrap();

        let starved = executor.submit(|| Ok::<_, String>(()));
        let receipt = starved.wait();
        assert!(matches!(
            receipt.result,
            Err(OperationError::Sequencer(SequencerError::AcquireTimeout { .. }))
        ));
        drop(guard);

        let next = executor.submit(|| Ok::<_, String>("ran"));
        assert_eq!(next.wait().into_result().unwrap(), "ran");

        let outcomes = outcomes.lock().unwrap();
        assert!(matches!(outcomes[0].1, OperationOutcome::Withdrawn { .. }));
        assert!(!outcomes[0].1.is_applied());
        assert_eq!(outcomes[1].1, OperationOutcome::Completed);
    }

    #[test]
    fn test_handle_cancel_before_turn() {
        let executor = Executor::default();
        let holder = executor.sequencer().issue();
        let guard = executor.sequencer().acquire(holder).unwrap();

        let cancelled = executor.submit(|| Ok::<_, String>("never"));
        let after = executor.submit(|| Ok::<_, String>("after"));
        assert!(cancelled.cancel());
        drop(guard);

        assert!(matches!(
            cancelled.wait().result,
            Err(OperationError::Sequencer(SequencerError::Cancelled { .. }))
        ));
        assert_eq!(after.wait().into_result().unwrap(), "after");
    }

    #[tokio::test]
    async fn test_dropped_async_acquire_withdraws_ticket() {
        let sequencer = Arc::new(Sequencer::new());
        let first = sequencer.issue();
        let second = sequencer.issue();
        let third = sequencer.issue();
        let guard = sequencer.acquire(first).unwrap();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), sequencer.acquire_async(second)).await;
        assert!(timed_out.is_err());
        assert_eq!(sequencer.outstanding(), vec![first, third]);

        drop(guard);
        let turn = tokio::time::timeout(Duration::from_secs(1), sequencer.acquire_async(third))
            .await
            .expect("third ticket stuck behind a dropped waiter")
            .unwrap();
        assert_eq!(turn.ticket(), third);
    }
}
