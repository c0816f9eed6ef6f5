//! Server configuration with defaults, file, and environment overrides.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

const CONFIG_FILE: &str = "config.toml";

/// HTTP server configuration.
///
/// Loaded in priority order: environment variables, then `config.toml`,
/// then built-in defaults. The service runs out of the box with the
/// defaults; the file and environment exist for deployment overrides.
/// Database settings are deliberately not here — they are resolved from
/// the raw environment per operation by `blackhole-core`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// Path of the acknowledgement payload served for every request.
    ///
    /// Environment variable: `RESPONSE_FILE`
    #[serde(default = "default_response_file", alias = "RESPONSE_FILE")]
    pub response_file: String,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_SECS`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from defaults, `config.toml`, and environment
    /// overrides, then validates it.
    pub fn load() -> Result<Self> {
        if std::env::var_os("HOST").is_none() {
            warn!("no HOST variable set, binding to all interfaces");
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the bind `SocketAddr` from host and port.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.response_file.is_empty() {
            anyhow::bail!("response_file must not be empty");
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            response_file: default_response_file(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_response_file() -> String {
    "response.xml".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, sync::Mutex};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct TestEnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        originals: HashMap<String, Option<String>>,
    }

    impl TestEnvGuard {
        fn new() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut guard = Self { _lock: lock, originals: HashMap::new() };
            for key in ["HOST", "PORT", "RESPONSE_FILE", "REQUEST_TIMEOUT_SECS"] {
                guard.save(key);
                env::remove_var(key);
            }
            guard
        }

        fn set_var(&mut self, key: &str, value: &str) {
            self.save(key);
            env::set_var(key, value);
        }

        fn save(&mut self, key: &str) {
            self.originals.entry(key.to_string()).or_insert_with(|| env::var(key).ok());
        }
    }

    impl Drop for TestEnvGuard {
        fn drop(&mut self) {
            for (key, original) in &self.originals {
                match original {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn defaults_validate_and_bind_everywhere() {
        let _guard = TestEnvGuard::new();

        let config = Config::load().expect("defaults should load");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.response_file, "response.xml");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_win() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("HOST", "127.0.0.1");
        guard.set_var("PORT", "9090");
        guard.set_var("RESPONSE_FILE", "ack.xml");
        guard.set_var("REQUEST_TIMEOUT_SECS", "5");

        let config = Config::load().expect("env overrides should load");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.response_file, "ack.xml");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn server_addr_combines_host_and_port() {
        let config =
            Config { host: "127.0.0.1".into(), port: 9090, ..Config::default() };
        let addr = config.parse_server_addr().expect("address should parse");
        insta::assert_snapshot!(addr.to_string(), @"127.0.0.1:9090");
    }

    #[test]
    fn hostname_bind_address_is_rejected() {
        let config = Config { host: "not an address".into(), ..Config::default() };
        assert!(config.parse_server_addr().is_err());
    }

    #[test]
    fn port_zero_fails_validation() {
        let config = Config { port: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_response_file_fails_validation() {
        let config = Config { response_file: String::new(), ..Config::default() };
        assert!(config.validate().is_err());
    }
}
