use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticket_sequencer::account::{Account, AccountConfig, AccountError};
use ticket_sequencer::sequencer::{OperationError, OperationOutcome, SequencerEvent, Ticket};

#[cfg(test)]
mod tests {
    use super::*;

    fn config(authentication_delay_ms: u64, scheduling_jitter_ms: u64) -> AccountConfig {
        AccountConfig {
            authentication_delay_ms,
            scheduling_jitter_ms,
            ..AccountConfig::default()
        }
    }

    fn recording_account(config: &AccountConfig) -> (Account, Arc<Mutex<Vec<SequencerEvent>>>) {
        let mut account = Account::new(config).unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        account.add_listener(move |event| {
            events_clone.lock().unwrap().push(event.clone());
        });
        (account, events)
    }

    fn applied_tickets(events: &[SequencerEvent]) -> Vec<Ticket> {
        events
            .iter()
            .filter(|e| e.outcome.is_applied())
            .map(|e| e.ticket)
            .collect()
    }

    // --- deposits under scheduling jitter ---

    #[test]
    fn test_jittered_deposits_apply_in_submission_order() {
        let (account, events) = recording_account(&config(0, 500));

        let handles = vec![
            account.deposit(100),
            account.deposit(200),
            account.deposit(700),
        ];
        let tickets: Vec<Ticket> = handles.iter().map(|h| h.ticket()).collect();
        let balances: Vec<i64> = handles
            .into_iter()
            .map(|h| h.wait().into_result().unwrap())
            .collect();

        assert_eq!(balances, vec![100, 300, 1000]);
        assert_eq!(account.balance(), 1000);
        assert_eq!(applied_tickets(&events.lock().unwrap()), tickets);
    }

    #[test]
    fn test_sequential_deposits_with_pauses() {
        let account = Account::new(&config(0, 0)).unwrap();
        for amount in [100, 200, 700] {
            let _handle = account.deposit(amount);
            std::thread::sleep(Duration::from_millis(5));
        }
        account.wait_idle();
        assert_eq!(account.balance(), 1000);
    }

    // --- one deposit, five withdrawals ---

    #[test]
    fn test_deposit_then_five_withdrawals() {
        let (account, events) = recording_account(&config(20, 0));

        let deposit = account.deposit(1000);
        let withdrawals: Vec<_> = (0..5).map(|_| account.withdraw(1000)).collect();

        assert_eq!(deposit.wait().into_result().unwrap(), 1000);

        let results: Vec<_> = withdrawals
            .into_iter()
            .map(|h| h.wait().into_result())
            .collect();
        assert_eq!(*results[0].as_ref().unwrap(), 0);
        for result in &results[1..] {
            match result {
                Err(OperationError::Action(AccountError::InsufficientFunds { balance, amount })) => {
                    assert_eq!(*balance, 0);
                    assert_eq!(*amount, 1000);
                }
                other => panic!("expected insufficient funds, got {other:?}"),
            }
        }

        assert_eq!(account.balance(), 0);
        assert!(account.sequencer().is_idle());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0].outcome, OperationOutcome::Completed);
        assert_eq!(events[1].outcome, OperationOutcome::Completed);
        assert!(events[2..]
            .iter()
            .all(|e| matches!(e.outcome, OperationOutcome::Failed { .. })));
    }

    // --- withdraw before any deposit ---

    #[test]
    fn test_mixed_withdrawals_and_deposits() {
        let account = Account::new(&config(10, 0)).unwrap();

        let handles = vec![
            account.withdraw(1000),
            account.deposit(500),
            account.deposit(500),
            account.withdraw(500),
            account.withdraw(500),
            account.withdraw(1000),
        ];
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.wait().into_result().map_err(|e| e.into_action()))
            .collect();

        assert_eq!(
            results,
            vec![
                Err(Some(AccountError::InsufficientFunds {
                    balance: 0,
                    amount: 1000
                })),
                Ok(500),
                Ok(1000),
                Ok(500),
                Ok(0),
                Err(Some(AccountError::InsufficientFunds {
                    balance: 0,
                    amount: 1000
                })),
            ]
        );
        assert_eq!(account.balance(), 0);
    }

    // --- failed withdrawals between later deposits ---

    #[test]
    fn test_interleaved_deposits_and_failing_withdrawals() {
        let (account, events) = recording_account(&config(10, 30));

        let handles = vec![
            account.deposit(2000),
            account.withdraw(500),
            account.withdraw(1000),
            account.withdraw(1500),
            account.deposit(4000),
            account.withdraw(2000),
            account.withdraw(2500),
            account.withdraw(3000),
            account.deposit(5000),
            account.withdraw(3500),
            account.withdraw(4000),
        ];
        let tickets: Vec<Ticket> = handles.iter().map(|h| h.ticket()).collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.wait().into_result().map_err(|e| e.into_action()))
            .collect();

        let insufficient = |balance: i64, amount: i64| -> Result<i64, Option<AccountError>> {
            Err(Some(AccountError::InsufficientFunds { balance, amount }))
        };
        assert_eq!(
            results,
            vec![
                Ok(2000),
                Ok(1500),
                Ok(500),
                insufficient(500, 1500),
                Ok(4500),
                Ok(2500),
                Ok(0),
                insufficient(0, 3000),
                Ok(5000),
                Ok(1500),
                insufficient(1500, 4000),
            ]
        );
        assert_eq!(account.balance(), 1500);
        assert!(account.sequencer().is_idle());

        let events = events.lock().unwrap();
        let observed: Vec<Ticket> = events.iter().map(|e| e.ticket).collect();
        assert_eq!(observed, tickets);
        assert_eq!(applied_tickets(&events), tickets);
        let failed: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e.outcome, OperationOutcome::Failed { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(failed, vec![3, 7, 10]);
    }

    // --- authentication failure ---

    #[test]
    fn test_failed_authentication_does_not_block_later_operations() {
        let authenticator = || -> Result<(), AccountError> {
            Err(AccountError::AuthenticationFailed {
                reason: "token expired".to_string(),
            })
        };
        let account = Account::with_authenticator(
            &AccountConfig {
                opening_balance: 300,
                ..config(0, 0)
            },
            Arc::new(authenticator),
        )
        .unwrap();

        let withdraw = account.withdraw(100);
        let deposit = account.deposit(50);

        let err = withdraw.wait().into_result().unwrap_err();
        assert_eq!(err.as_label(), "action_failed");
        assert!(matches!(
            err.into_action(),
            Some(AccountError::AuthenticationFailed { .. })
        ));
        assert!(
            account.sequencer().wait_idle_timeout(Duration::from_secs(2)),
            "operations stuck behind a failed authentication"
        );
        assert_eq!(deposit.wait().into_result().unwrap(), 350);
    }

    #[test]
    fn test_invalid_amounts_are_rejected() {
        let account = Account::new(&config(0, 0)).unwrap();
        let deposit = account.deposit(0);
        let withdraw = account.withdraw(-5);

        assert_eq!(
            deposit.wait().into_result().unwrap_err().into_action(),
            Some(AccountError::InvalidAmount { amount: 0 })
        );
        assert_eq!(
            withdraw.wait().into_result().unwrap_err().into_action(),
            Some(AccountError::InvalidAmount { amount: -5 })
        );
        assert_eq!(account.balance(), 0);
        assert!(account.sequencer().is_idle());
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let account = Account::new(&AccountConfig {
            opening_balance: i64::MAX - 1,
            ..config(0, 0)
        })
        .unwrap();
        let err = account.deposit(10).wait().into_result().unwrap_err();
        assert_eq!(err.action().map(AccountError::as_label), Some("overflow"));
        assert_eq!(account.balance(), i64::MAX - 1);
    }

    #[test]
    fn test_independent_accounts_do_not_share_state() {
        let first = Account::new(&config(0, 0)).unwrap();
        let second = Account::new(&config(0, 0)).unwrap();

        let a = first.deposit(10);
        let b = second.deposit(20);
        assert_eq!(a.ticket(), b.ticket());
        a.wait().into_result().unwrap();
        b.wait().into_result().unwrap();

        assert_eq!(first.balance(), 10);
        assert_eq!(second.balance(), 20);
    }
}
