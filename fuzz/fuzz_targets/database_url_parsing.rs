#![no_main]

//! Fuzz target for connection-string parsing.
//!
//! The URL form is operator-supplied rather than attacker-supplied, but
//! a malformed value must still come back as a configuration error, not
//! a panic, and a successful parse must fill every field.

use blackhole_core::DbConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = DbConfig::parse_url(raw) {
        assert!(!config.host.is_empty());
        assert!(!config.username.is_empty());
        assert!(!config.password.is_empty());
        assert!(!config.database.is_empty());
        // The masked rendering must never echo the password field.
        assert!(config.masked_url().contains("***"));
    }
});
