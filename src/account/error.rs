/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

use thiserror::Error;

/// Domain failures of account operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The withdrawal exceeds the current balance.
    #[error("insufficient funds: balance {balance}, requested {amount}")]
    InsufficientFunds {
        /// Balance at the time of the withdrawal.
        balance: i64,
        /// Amount requested.
        amount: i64,
    },

    /// The caller could not be authenticated.
    #[error("authentication failed: {reason}")]
    AuthenticationFailed {
        /// Why authentication failed.
        reason: String,
    },

    /// Amounts must be strictly positive.
    #[error("invalid amount {amount}: must be positive")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// The deposit would overflow the balance.
    #[error("deposit of {amount} overflows balance {balance}")]
    Overflow {
        /// Balance at the time of the deposit.
        balance: i64,
        /// Amount deposited.
        amount: i64,
    },
}

impl AccountError {
    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::Overflow { .. } => "overflow",
        }
    }
}
