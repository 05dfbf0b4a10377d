/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

use crate::config::{ConfigError, Validate};
use crate::sequencer::SequencerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an [`Account`](super::Account).
///
/// # Examples
///
/// ```
/// use ticket_sequencer::account::AccountConfig;
/// use ticket_sequencer::config::from_json_str;
///
/// let config: AccountConfig = from_json_str(r#"{
///     "opening_balance": 250,
///     "authentication_delay_ms": 10,
///     "sequencer": { "name": "savings" }
/// }"#).unwrap();
/// assert_eq!(config.opening_balance, 250);
/// assert_eq!(config.sequencer.name, "savings");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Balance the account starts with.
    pub opening_balance: i64,
    /// Time the default authenticator takes per withdrawal.
    pub authentication_delay_ms: u64,
    /// Upper bound of the random delay each operation sleeps before taking
    /// its turn (`0` disables it).
    pub scheduling_jitter_ms: u64,
    /// Sequencer ordering the account's operations.
    pub sequencer: SequencerConfig,
}

impl AccountConfig {
    /// Authentication delay as a [`Duration`].
    #[must_use]
    pub fn authentication_delay(&self) -> Duration {
        Duration::from_millis(self.authentication_delay_ms)
    }

    /// Scheduling jitter bound as a [`Duration`].
    #[must_use]
    pub fn scheduling_jitter(&self) -> Duration {
        Duration::from_millis(self.scheduling_jitter_ms)
    }
}

impl Default for AccountConfig {
    /// - `opening_balance = 0`
    /// - `authentication_delay_ms = 500`
    /// - `scheduling_jitter_ms = 0`
    /// - `sequencer.name = "account"`
    fn default() -> Self {
        Self {
            opening_balance: 0,
            authentication_delay_ms: 500,
            scheduling_jitter_ms: 0,
            sequencer: SequencerConfig {
                name: "account".to_string(),
                ..SequencerConfig::default()
            },
        }
    }
}

impl Validate for AccountConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.opening_balance < 0 {
            return Err(ConfigError::Invalid {
                field: "opening_balance",
                reason: format!("must not be negative, got {}", self.opening_balance),
            });
        }
        self.sequencer.validate()
    }
}
