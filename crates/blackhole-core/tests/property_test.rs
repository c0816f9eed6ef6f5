//! Property-based tests for connection-string parsing.
//!
//! The URL form is the one input the configuration path accepts from an
//! uncontrolled source, so parsing must hold its field mapping for every
//! well-formed string and reject the rest without panicking.

#![allow(clippy::unwrap_used)] // Test regex patterns are known to be valid

use blackhole_core::DbConfig;
use proptest::{prelude::*, test_runner::Config as ProptestConfig};

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 100,
        timeout: 5000, // 5 seconds max
        fork: false,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

fn scheme_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{2,8}").unwrap()
}

fn user_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").unwrap()
}

/// Uppercase-only so the password can never collide with the lowercase
/// user/host/database when asserting on masked output.
fn password_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9]{3,15}").unwrap()
}

fn host_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9][a-z0-9.-]{0,15}").unwrap()
}

fn database_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").unwrap()
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Every well-formed URL maps its pieces to exactly the five fields.
    #[test]
    fn full_form_urls_parse_field_for_field(
        scheme in scheme_strategy(),
        user in user_strategy(),
        password in password_strategy(),
        host in host_strategy(),
        port in 1u16..=u16::MAX,
        database in database_strategy(),
    ) {
        let raw = format!("{scheme}://{user}:{password}@{host}:{port}/{database}");
        let config = DbConfig::parse_url(&raw).unwrap();

        prop_assert_eq!(config.host, host);
        prop_assert_eq!(config.port, port);
        prop_assert_eq!(config.username, user);
        prop_assert_eq!(config.password, password);
        prop_assert_eq!(config.database, database);
    }

    /// The masked rendering keeps every field except the password.
    #[test]
    fn masked_url_never_leaks_the_password(
        user in user_strategy(),
        password in password_strategy(),
        host in host_strategy(),
        port in 1u16..=u16::MAX,
        database in database_strategy(),
    ) {
        let raw = format!("mysql://{user}:{password}@{host}:{port}/{database}");
        let config = DbConfig::parse_url(&raw).unwrap();
        let masked = config.masked_url();

        prop_assert!(!masked.contains(&password));
        prop_assert!(masked.contains(&host));
        prop_assert!(masked.contains(&database));
        prop_assert!(masked.contains("***"));
    }

    /// Arbitrary input never panics the parser; it parses or it errors.
    #[test]
    fn parsing_arbitrary_input_never_panics(raw in "\\PC{0,80}") {
        let _ = DbConfig::parse_url(&raw);
    }
}
