//! Test utilities shared across the workspace.
//!
//! Serialized environment mutation, notification fixture bodies, and a
//! polling helper for asserting on fire-and-forget work. Re-exports the
//! in-memory storage and test clock from `blackhole-core` so integration
//! tests need only one import.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{
    collections::HashMap,
    env,
    future::Future,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use bytes::Bytes;

pub use blackhole_core::{storage::mock::MemoryVisitStorage, TestClock};

/// Serializes environment mutation across every test using [`EnvGuard`].
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Environment mutation with save and restore on drop.
///
/// Holds a process-wide lock for its lifetime, so tests touching the
/// environment never interleave. Creating a guard clears the database
/// variables up front; each test sets only what it needs.
pub struct EnvGuard {
    _lock: MutexGuard<'static, ()>,
    originals: HashMap<String, Option<String>>,
}

impl EnvGuard {
    /// Claims the environment and clears the database variables.
    pub fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut guard = Self { _lock: lock, originals: HashMap::new() };
        for key in [
            blackhole_core::config::ENV_HOST,
            blackhole_core::config::ENV_PORT,
            blackhole_core::config::ENV_USER,
            blackhole_core::config::ENV_PASSWORD,
            blackhole_core::config::ENV_APP_NAME,
            blackhole_core::config::ENV_DATABASE_URL,
        ] {
            guard.remove(key);
        }
        guard
    }

    /// Sets a variable, remembering its original value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.save(key);
        env::set_var(key, value);
    }

    /// Removes a variable, remembering its original value.
    pub fn remove(&mut self, key: &str) {
        self.save(key);
        env::remove_var(key);
    }

    fn save(&mut self, key: &str) {
        self.originals.entry(key.to_string()).or_insert_with(|| env::var(key).ok());
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, original) in &self.originals {
            match original {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

/// Builder for SOAP-shaped notification bodies.
///
/// Produces the outbound-message XML the endpoint actually receives,
/// with the organization id present, absent, or namespace-prefixed.
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    org_id: Option<String>,
    prefix: Option<String>,
}

impl NotificationBuilder {
    /// A notification carrying the canonical test organization id.
    pub fn with_defaults() -> Self {
        Self { org_id: Some("00D000000000062EA2".to_string()), prefix: None }
    }

    /// A notification with no organization id element at all.
    pub fn without_org_id() -> Self {
        Self { org_id: None, prefix: None }
    }

    /// Overrides the organization id.
    #[must_use]
    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Prefixes the organization-id element with a namespace.
    #[must_use]
    pub fn namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Renders the notification body.
    pub fn build(&self) -> Bytes {
        let org_element = match (&self.org_id, &self.prefix) {
            (Some(org_id), Some(prefix)) => {
                format!("   <{prefix}:OrganizationId>{org_id}</{prefix}:OrganizationId>\n")
            }
            (Some(org_id), None) => {
                format!("   <OrganizationId>{org_id}</OrganizationId>\n")
            }
            (None, _) => String::new(),
        };
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\n\
             \x20<soapenv:Body>\n\
             \x20 <notifications xmlns=\"http://soap.sforce.com/2005/09/outbound\">\n\
             {org_element}\
             \x20  <ActionId>04k000000000001AAA</ActionId>\n\
             \x20 </notifications>\n\
             \x20</soapenv:Body>\n\
             </soapenv:Envelope>\n"
        );
        Bytes::from(body)
    }
}

/// Polls a condition until it holds or the timeout elapses.
///
/// For asserting on spawned fire-and-forget work: returns true as soon
/// as the condition passes, false when `timeout` runs out first.
pub async fn wait_for<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
