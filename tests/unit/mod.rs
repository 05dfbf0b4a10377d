mod bank_scenarios;
mod config_tests;
