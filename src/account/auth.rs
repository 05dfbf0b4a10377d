/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Authentication performed before a withdrawal takes its turn.

use super::error::AccountError;
use std::time::Duration;

/// Authenticates the caller of a withdrawal.
pub trait Authenticator: Send + Sync {
    /// Returns `Ok(())` if the withdrawal may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::AuthenticationFailed`] to reject it.
    fn authenticate(&self) -> Result<(), AccountError>;
}

impl<F> Authenticator for F
where
    F: Fn() -> Result<(), AccountError> + Send + Sync,
{
    fn authenticate(&self) -> Result<(), AccountError> {
        self()
    }
}

/// Always succeeds, after a fixed delay standing in for a slow backend.
#[derive(Debug, Clone, Copy)]
pub struct DelayAuthenticator {
    delay: Duration,
}

impl DelayAuthenticator {
    /// Creates an authenticator that takes `delay` per call.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Authenticator for DelayAuthenticator {
    fn authenticate(&self) -> Result<(), AccountError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(())
    }
}
