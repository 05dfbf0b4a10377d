use std::io::Write;
use std::time::Duration;
use ticket_sequencer::account::AccountConfig;
use ticket_sequencer::config::{ConfigError, Validate, from_json_file, from_json_str};
use ticket_sequencer::sequencer::{Executor, SequencerConfig};

#[cfg(test)]
mod tests {
    use super::*;

    // --- sequencer config ---

    #[test]
    fn test_sequencer_defaults() {
        let config = SequencerConfig::default();
        assert_eq!(config.name, "sequencer");
        assert_eq!(config.first_ticket, 1);
        assert_eq!(config.acquire_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sequencer_partial_json_uses_defaults() {
        let config: SequencerConfig =
            from_json_str(r#"{ "acquire_timeout_ms": 1500, "thread_name_prefix": "ledger-op" }"#)
                .unwrap();
        assert_eq!(config.name, "sequencer");
        assert_eq!(config.acquire_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.thread_name_prefix, "ledger-op");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = from_json_str::<SequencerConfig>(r#"{ "acquire_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "acquire_timeout_ms",
                ..
            }
        ));
        assert_eq!(err.as_label(), "config_invalid");
    }

    #[test]
    fn test_empty_name_rejected() {
        let config = SequencerConfig {
            name: "  ".to_string(),
            ..SequencerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "name", .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = from_json_str::<SequencerConfig>("{ name: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_configured_prefix_names_threads() {
        let config = SequencerConfig {
            thread_name_prefix: "named".to_string(),
            first_ticket: 40,
            ..SequencerConfig::default()
        };
        let executor = Executor::new(&config);
        let handle = executor.submit(|| {
            Ok::<_, String>(std::thread::current().name().map(str::to_string))
        });
        assert_eq!(
            handle.wait().into_result().unwrap().as_deref(),
            Some("named-40")
        );
    }

    // --- account config ---

    #[test]
    fn test_account_defaults() {
        let config = AccountConfig::default();
        assert_eq!(config.opening_balance, 0);
        assert_eq!(config.authentication_delay(), Duration::from_millis(500));
        assert_eq!(config.scheduling_jitter(), Duration::ZERO);
        assert_eq!(config.sequencer.name, "account");
    }

    #[test]
    fn test_negative_opening_balance_rejected() {
        let err = from_json_str::<AccountConfig>(r#"{ "opening_balance": -1 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "opening_balance",
                ..
            }
        ));
    }

    #[test]
    fn test_nested_sequencer_config_validated() {
        let err = from_json_str::<AccountConfig>(r#"{ "sequencer": { "name": "" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "name", .. }));
    }

    #[test]
    fn test_account_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "opening_balance": 75, "scheduling_jitter_ms": 20, "sequencer": {{ "name": "file" }} }}"#
        )
        .unwrap();

        let config: AccountConfig = from_json_file(file.path()).unwrap();
        assert_eq!(config.opening_balance, 75);
        assert_eq!(config.scheduling_jitter(), Duration::from_millis(20));
        assert_eq!(config.sequencer.name, "file");
        assert_eq!(config.authentication_delay_ms, 500);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = from_json_file::<AccountConfig>(dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.as_label(), "config_io");
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = AccountConfig {
            opening_balance: 10,
            ..AccountConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AccountConfig = from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
