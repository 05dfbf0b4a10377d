/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Sequencer and executor configuration.

use crate::config::{ConfigError, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`Sequencer`](super::Sequencer) and the
/// [`Executor`](super::Executor) that drives it.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::sequencer::SequencerConfig;
/// use std::time::Duration;
///
/// let mut config = SequencerConfig::default();
/// config.acquire_timeout_ms = Some(250);
/// assert_eq!(config.acquire_timeout(), Some(Duration::from_millis(250)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Name attached to every log line of this sequencer.
    pub name: String,
    /// Value of the first ticket issued.
    pub first_ticket: u64,
    /// Upper bound on how long an executor operation waits for its turn
    /// before withdrawing (`None` waits forever).
    pub acquire_timeout_ms: Option<u64>,
    /// Prefix for the names of threads spawned per operation.
    pub thread_name_prefix: String,
}

impl SequencerConfig {
    /// Returns the acquire timeout as a [`Duration`].
    #[must_use]
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SequencerConfig {
    /// - `name = "sequencer"`
    /// - `first_ticket = 1`
    /// - `acquire_timeout_ms = None`
    /// - `thread_name_prefix = "seq-op"`
    fn default() -> Self {
        Self {
            name: "sequencer".to_string(),
            first_ticket: 1,
            acquire_timeout_ms: None,
            thread_name_prefix: "seq-op".to_string(),
        }
    }
}

impl Validate for SequencerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.first_ticket == u64::MAX {
            return Err(ConfigError::Invalid {
                field: "first_ticket",
                reason: "leaves no room for a second ticket".to_string(),
            });
        }
        if self.acquire_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "acquire_timeout_ms",
                reason: "must be positive; omit it to wait forever".to_string(),
            });
        }
        if self.thread_name_prefix.contains('\0') || self.thread_name_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "thread_name_prefix",
                reason: "must be a non-empty string without NUL bytes".to_string(),
            });
        }
        Ok(())
    }
}
