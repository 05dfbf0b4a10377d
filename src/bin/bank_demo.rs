/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Replays the bank scenarios: deposits and withdrawals each run on their
//! own thread, yet the balance changes in request order.
//!
//! Usage: `bank-demo [config.json]`. Log verbosity follows `RUST_LOG`
//! (default `info`).

use std::error::Error;
use std::time::Duration;
use ticket_sequencer::account::{Account, AccountConfig, AccountError};
use ticket_sequencer::config::from_json_file;
use ticket_sequencer::sequencer::OperationHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .with_target(false)
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => from_json_file::<AccountConfig>(&path)?,
        None => AccountConfig::default(),
    };
    // Expected balances assume every scenario starts empty.
    if config.opening_balance != 0 {
        warn!(
            opening_balance = config.opening_balance,
            "ignoring configured opening balance; scenarios start from zero"
        );
        config.opening_balance = 0;
    }
    info!(?config, "starting bank demo");

    let mut failures = 0;
    for (name, scenario) in SCENARIOS {
        info!(scenario = name, "running scenario");
        let account = open_account(&config)?;
        let expected = scenario(&account);
        account.wait_idle();
        let balance = account.balance();
        if balance == expected {
            info!(scenario = name, balance, "scenario passed");
        } else {
            error!(scenario = name, balance, expected, "scenario failed");
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} scenario(s) failed").into());
    }
    Ok(())
}

type Scenario = fn(&Account) -> i64;

const SCENARIOS: [(&str, Scenario); 5] = [
    ("paced_deposits", paced_deposits),
    ("burst_deposits", burst_deposits),
    ("overdrawn_withdrawals", overdrawn_withdrawals),
    ("withdraw_before_deposit", withdraw_before_deposit),
    ("interleaved_refusals", interleaved_refusals),
];

fn open_account(config: &AccountConfig) -> Result<Account, Box<dyn Error>> {
    let mut account = Account::new(config)?;
    account.add_listener(|event| match serde_json::to_string(event) {
        Ok(json) => debug!(event = %json, "operation event"),
        Err(e) => warn!(error = %e, "failed to encode event"),
    });
    Ok(account)
}

/// Deposits with a short pause between submissions.
fn paced_deposits(account: &Account) -> i64 {
    let mut handles = Vec::new();
    for amount in [100, 200, 700] {
        handles.push(account.deposit(amount));
        std::thread::sleep(Duration::from_millis(50));
    }
    handles.into_iter().for_each(report);
    1000
}

/// Deposits submitted back to back.
fn burst_deposits(account: &Account) -> i64 {
    let handles = [100, 200, 700].map(|amount| account.deposit(amount));
    handles.into_iter().for_each(report);
    1000
}

/// One deposit followed by more withdrawals than it can cover.
fn overdrawn_withdrawals(account: &Account) -> i64 {
    let mut handles = vec![account.deposit(1000)];
    handles.extend((0..5).map(|_| account.withdraw(1000)));
    handles.into_iter().for_each(report);
    0
}

/// Withdrawals interleaved with deposits, starting from an empty account.
fn withdraw_before_deposit(account: &Account) -> i64 {
    let handles = vec![
        account.withdraw(1000),
        account.deposit(500),
        account.deposit(500),
        account.withdraw(500),
        account.withdraw(500),
        account.withdraw(1000),
    ];
    handles.into_iter().for_each(report);
    0
}

/// Refused withdrawals between later deposits that would have covered them.
fn interleaved_refusals(account: &Account) -> i64 {
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
    handles.into_iter().for_each(report);
    1500
}

fn report(handle: OperationHandle<i64, AccountError>) {
    let receipt = handle.wait();
    match receipt.result {
        Ok(balance) => info!(ticket = %receipt.ticket, balance, "operation succeeded"),
        Err(e) => warn!(ticket = %receipt.ticket, reason = e.as_label(), error = %e, "operation failed"),
    }
}
