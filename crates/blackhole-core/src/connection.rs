//! Per-operation connection opening and the reconnect gate.
//!
//! Connections are never pooled: every operation gets a fresh one and
//! closes it itself. What is shared is the recovery state — after a
//! connection-level failure the provider holds a gate shut while it
//! probes the server on a fixed delay, so operations started in the
//! meantime wait for the probe sequence instead of failing straight away.

use std::{future::Future, sync::Arc, time::Duration};

use sqlx::{mysql::MySqlConnectOptions, Connection, MySqlConnection};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    config::DbConfig,
    error::{CoreError, Result},
    time::Clock,
};

/// Fixed delay and probe budget for the reconnect path.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Pause before each probe.
    pub delay: Duration,
    /// Probes attempted before the gate releases without success.
    pub max_probes: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { delay: Duration::from_secs(2), max_probes: 5 }
    }
}

/// Opens one MySQL connection per operation.
///
/// Configuration is resolved from the environment on every call, so a
/// changed variable takes effect on the next operation without a restart.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    clock: Arc<dyn Clock>,
    policy: ReconnectPolicy,
    gate: Arc<Mutex<()>>,
}

impl ConnectionProvider {
    /// Creates a provider with the default reconnect policy.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(clock, ReconnectPolicy::default())
    }

    /// Creates a provider with an explicit reconnect policy.
    pub fn with_policy(clock: Arc<dyn Clock>, policy: ReconnectPolicy) -> Self {
        Self { clock, policy, gate: Arc::new(Mutex::new(())) }
    }

    /// Opens a fresh connection for one operation.
    ///
    /// Waits for any in-flight recovery to release the gate, then
    /// resolves configuration and connects. The caller owns the
    /// connection and closes it when the operation ends.
    pub async fn open(&self) -> Result<MySqlConnection> {
        drop(self.gate.lock().await);
        let config = DbConfig::resolve()?;
        connect(&config).await
    }

    /// Arms the recovery path after a connection-level failure.
    ///
    /// Claims the gate synchronously, so an operation that starts after
    /// this call waits in [`open`](Self::open) until a probe reconnects
    /// or the probe budget runs out. When recovery is already in flight
    /// the call is a no-op: overlapping losses collapse into the one
    /// running probe sequence. The in-flight operation that observed the
    /// failure is not retried; it has already failed.
    pub fn note_connection_lost(&self) {
        let Ok(guard) = self.gate.clone().try_lock_owned() else {
            debug!("reconnect already in progress");
            return;
        };
        warn!("database connection lost, probing before further operations");

        let clock = self.clock.clone();
        let policy = self.policy;
        tokio::spawn(async move {
            let _gate = guard;
            recover(clock.as_ref(), policy, || async {
                let config = DbConfig::resolve()?;
                let conn = connect(&config).await?;
                if let Err(error) = conn.close().await {
                    debug!(%error, "probe connection close failed");
                }
                Ok(())
            })
            .await;
        });
    }
}

async fn connect(config: &DbConfig) -> Result<MySqlConnection> {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database);

    MySqlConnection::connect_with(&options)
        .await
        .map_err(|err| CoreError::connection(err.to_string()))
}

/// Runs the bounded probe loop: sleep, probe, re-arm on failure.
///
/// Returns true once a probe succeeds. Exhausting the budget returns
/// false and releases the caller's gate; the next failing operation
/// arms a new sequence.
async fn recover<F, Fut>(clock: &dyn Clock, policy: ReconnectPolicy, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    for attempt in 1..=policy.max_probes {
        clock.sleep(policy.delay).await;
        match probe().await {
            Ok(()) => {
                info!(attempt, "database connection re-established");
                return true;
            }
            Err(error) => {
                warn!(attempt, max_probes = policy.max_probes, %error, "reconnect probe failed");
            }
        }
    }
    error!(
        probes = policy.max_probes,
        "reconnect probes exhausted, next operation will arm a new sequence"
    );
    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::time::TestClock;

    #[test]
    fn default_policy_is_two_seconds_five_probes() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(2));
        assert_eq!(policy.max_probes, 5);
    }

    #[tokio::test]
    async fn recover_sleeps_once_before_a_successful_probe() {
        let clock = TestClock::new();
        let policy = ReconnectPolicy { delay: Duration::from_secs(2), max_probes: 5 };

        let recovered = recover(&clock, policy, || async { Ok(()) }).await;

        assert!(recovered);
        assert_eq!(clock.sleep_count(), 1);
        assert_eq!(clock.slept(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn recover_rearms_the_delay_after_each_failed_probe() {
        let clock = TestClock::new();
        let policy = ReconnectPolicy { delay: Duration::from_secs(2), max_probes: 5 };
        let attempts = AtomicU32::new(0);

        let recovered = recover(&clock, policy, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(CoreError::connection("still down"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(recovered);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(clock.sleep_count(), 3);
        assert_eq!(clock.slept(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn recover_gives_up_after_the_probe_budget() {
        let clock = TestClock::new();
        let policy = ReconnectPolicy { delay: Duration::from_secs(2), max_probes: 5 };

        let recovered =
            recover(&clock, policy, || async { Err(CoreError::connection("still down")) }).await;

        assert!(!recovered);
        assert_eq!(clock.sleep_count(), 5);
    }

    #[tokio::test]
    async fn connection_loss_claims_the_gate_until_probes_finish() {
        let clock = Arc::new(TestClock::new());
        let policy = ReconnectPolicy { delay: Duration::from_secs(2), max_probes: 2 };
        let provider = ConnectionProvider::with_policy(clock.clone(), policy);

        provider.note_connection_lost();
        assert!(provider.gate.try_lock().is_err(), "gate must be held before recovery starts");

        // A second loss while recovery runs collapses into the first.
        provider.note_connection_lost();

        let mut released = false;
        for _ in 0..200 {
            if provider.gate.try_lock().is_ok() {
                released = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(released, "gate must release after the probe budget");
        assert!(clock.sleep_count() >= 1);
    }
}
