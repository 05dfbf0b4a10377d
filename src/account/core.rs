/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Bank account whose deposits and withdrawals run on their own threads but
//! apply in the order they were requested.

use super::auth::{Authenticator, DelayAuthenticator};
use super::config::AccountConfig;
use super::error::AccountError;
use super::store::{BalanceStore, SharedResource};
use crate::config::{ConfigError, Validate};
use crate::sequencer::{Executor, OperationHandle, Sequencer, SequencerEvent};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// An account balance mutated through a sequencer.
///
/// Every call to [`deposit`](Self::deposit) or [`withdraw`](Self::withdraw)
/// takes a ticket immediately and spawns the operation; the balance changes
/// in call order regardless of how the threads are scheduled.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::account::{Account, AccountConfig};
///
/// let config = AccountConfig { authentication_delay_ms: 0, ..AccountConfig::default() };
/// let account = Account::new(&config).unwrap();
///
/// let deposit = account.deposit(100);
/// let withdraw = account.withdraw(30);
/// assert_eq!(deposit.wait().into_result().unwrap(), 100);
/// assert_eq!(withdraw.wait().into_result().unwrap(), 70);
/// assert_eq!(account.balance(), 70);
/// ```
pub struct Account {
    executor: Executor,
    balance: Arc<BalanceStore>,
    authenticator: Arc<dyn Authenticator>,
    jitter: Duration,
}

impl Account {
    /// Creates an account that authenticates withdrawals with a
    /// [`DelayAuthenticator`] using the configured delay.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration is unusable.
    pub fn new(config: &AccountConfig) -> Result<Self, ConfigError> {
        let authenticator = DelayAuthenticator::new(config.authentication_delay());
        Self::with_authenticator(config, Arc::new(authenticator))
    }

    /// Creates an account with a custom authenticator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration is unusable.
    pub fn with_authenticator(
        config: &AccountConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            executor: Executor::new(&config.sequencer),
            balance: Arc::new(BalanceStore::new(config.opening_balance)),
            authenticator,
            jitter: config.scheduling_jitter(),
        })
    }

    /// Registers a listener for operation events.
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: Fn(&SequencerEvent) + Send + Sync + 'static,
    {
        self.executor.add_listener(listener);
    }

    /// Adds `amount` to the balance. Resolves to the new balance.
    pub fn deposit(&self, amount: i64) -> OperationHandle<i64, AccountError> {
        let balance = Arc::clone(&self.balance);
        let jitter = self.jitter;
        self.executor.submit_prepared(
            move || {
                validate_amount(amount)?;
                sleep_jitter(jitter);
                Ok(())
            },
            move |()| {
                let current = balance.read();
                let next = current
                    .checked_add(amount)
                    .ok_or(AccountError::Overflow {
                        balance: current,
                        amount,
                    })?;
                balance.write(next);
                info!(amount, balance = next, "deposit applied");
                Ok(next)
            },
        )
    }

    /// Removes `amount` from the balance after authenticating. Resolves to
    /// the new balance, or [`AccountError::InsufficientFunds`] if the balance
    /// at the withdrawal's turn is too low.
    ///
    /// Authentication runs before the withdrawal waits for its turn; if it
    /// fails the ticket is withdrawn and later operations proceed.
    pub fn withdraw(&self, amount: i64) -> OperationHandle<i64, AccountError> {
        let balance = Arc::clone(&self.balance);
        let authenticator = Arc::clone(&self.authenticator);
        let jitter = self.jitter;
        self.executor.submit_prepared(
            move || {
                validate_amount(amount)?;
                sleep_jitter(jitter);
                authenticator.authenticate()
            },
            move |()| {
                let holdings = balance.read();
                if holdings < amount {
                    warn!(
                        balance = holdings,
                        amount, "overdraft: insufficient funds for this withdrawal"
                    );
                    return Err(AccountError::InsufficientFunds {
                        balance: holdings,
                        amount,
                    });
                }
                let next = holdings - amount;
                balance.write(next);
                info!(amount, balance = next, "withdrawal applied");
                Ok(next)
            },
        )
    }

    /// Current balance.
    ///
    /// Read outside any turn: while operations are in flight this is only a
    /// snapshot. Call [`wait_idle`](Self::wait_idle) first for a settled value.
    #[must_use]
    pub fn balance(&self) -> i64 {
        self.balance.read()
    }

    /// Blocks until every submitted operation has released its ticket.
    pub fn wait_idle(&self) {
        self.executor.sequencer().wait_idle();
    }

    /// The sequencer ordering this account's operations.
    #[must_use]
    pub fn sequencer(&self) -> &Arc<Sequencer> {
        self.executor.sequencer()
    }
}

fn validate_amount(amount: i64) -> Result<(), AccountError> {
    if amount <= 0 {
        return Err(AccountError::InvalidAmount { amount });
    }
    Ok(())
}

fn sleep_jitter(max: Duration) {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return;
    }
    let delay = rand::rng().random_range(0..=max_ms);
    std::thread::sleep(Duration::from_millis(delay));
}
