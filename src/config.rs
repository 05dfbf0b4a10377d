/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! JSON configuration loading shared by [`SequencerConfig`] and
//! [`AccountConfig`].
//!
//! [`SequencerConfig`]: crate::sequencer::SequencerConfig
//! [`AccountConfig`]: crate::account::AccountConfig

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON for the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the runtime cannot use.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Io { .. } => "config_io",
            Self::Parse(_) => "config_parse",
            Self::Invalid { .. } => "config_invalid",
        }
    }
}

/// Configuration types that can check their own values.
pub trait Validate {
    /// Returns an error describing the first unusable field, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a field is out of range.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Parses and validates a configuration from a JSON string.
///
/// Missing fields fall back to their defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed JSON and
/// [`ConfigError::Invalid`] when validation fails.
///
/// # Examples
///
/// ```
/// use ticket_sequencer::config::from_json_str;
/// use ticket_sequencer::sequencer::SequencerConfig;
///
/// let config: SequencerConfig = from_json_str(r#"{ "name": "ledger" }"#).unwrap();
/// assert_eq!(config.name, "ledger");
/// assert_eq!(config.first_ticket, 1);
/// ```
pub fn from_json_str<T>(json: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate,
{
    let config: T = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates a JSON configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
/// same errors as [`from_json_str`].
pub fn from_json_file<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate,
{
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json_str(&json)
}
