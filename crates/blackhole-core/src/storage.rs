//! Storage abstraction for introspection, DDL, and visit writes.
//!
//! The trait keeps provisioning and visit logging testable without a
//! running MySQL server. The production implementation opens one
//! connection per call through `ConnectionProvider` and closes it before
//! returning; nothing is pooled or reused.

use std::{future::Future, pin::Pin, sync::Arc};

use sqlx::Connection;
use tracing::debug;

use crate::{
    connection::ConnectionProvider,
    error::{CoreError, Result},
};

/// Single INSERT issued per accepted notification. The organization id
/// travels as a bind parameter; the timestamp comes from the server.
const INSERT_VISIT: &str = "INSERT INTO visits (orgid, visit_time) VALUES (?, NOW())";

/// Storage operations required by provisioning and visit logging.
///
/// Abstracts the three statements this system ever issues so the logic
/// around them runs against lightweight in-memory doubles in tests. Every
/// method stands alone: implementations open whatever resources they need
/// per call and release them before resolving.
pub trait VisitStorage: Send + Sync + 'static {
    /// Lists which of the candidate tables already exist.
    ///
    /// Production issues one bounded introspection query with a
    /// `LIKE ? OR ...` filter per candidate; the result is a subset of
    /// `candidates`, never the whole schema.
    fn list_existing_tables(
        &self,
        candidates: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>>;

    /// Executes one DDL statement.
    ///
    /// Callers sequence statements themselves; a failure must leave
    /// previously executed statements applied (no rollback).
    fn execute_ddl(
        &self,
        statement: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Records one visit for the given organization identifier.
    fn record_visit(
        &self,
        org_id: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production storage backed by MySQL.
///
/// Every call resolves configuration, opens a fresh connection, runs its
/// single statement, and closes the connection. Connection-level failures
/// are reported to the provider so the reconnect path arms itself.
pub struct MysqlVisitStorage {
    provider: Arc<ConnectionProvider>,
}

impl MysqlVisitStorage {
    /// Creates a new MySQL storage adapter.
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }

    async fn open(provider: &ConnectionProvider) -> Result<sqlx::MySqlConnection> {
        provider.open().await.map_err(|err| note_if_lost(provider, err))
    }

    async fn settle<T>(
        provider: &ConnectionProvider,
        conn: sqlx::MySqlConnection,
        result: std::result::Result<T, sqlx::Error>,
    ) -> Result<T> {
        if let Err(error) = conn.close().await {
            debug!(%error, "connection close failed");
        }
        result.map_err(|err| note_if_lost(provider, CoreError::from(err)))
    }
}

fn note_if_lost(provider: &ConnectionProvider, err: CoreError) -> CoreError {
    if err.is_connection_lost() {
        provider.note_connection_lost();
    }
    err
}

impl VisitStorage for MysqlVisitStorage {
    fn list_existing_tables(
        &self,
        candidates: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>> {
        let provider = self.provider.clone();
        Box::pin(async move {
            if candidates.is_empty() {
                return Ok(Vec::new());
            }

            let filter = vec!["table_name LIKE ?"; candidates.len()].join(" OR ");
            let sql = format!(
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND ({filter})"
            );

            let mut conn = Self::open(&provider).await?;
            let mut query = sqlx::query_scalar::<_, String>(&sql);
            for name in &candidates {
                query = query.bind(name);
            }
            let result = query.fetch_all(&mut conn).await;
            Self::settle(&provider, conn, result).await
        })
    }

    fn execute_ddl(
        &self,
        statement: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let provider = self.provider.clone();
        Box::pin(async move {
            let mut conn = Self::open(&provider).await?;
            let result = sqlx::query(&statement).execute(&mut conn).await.map(|_| ());
            Self::settle(&provider, conn, result).await
        })
    }

    fn record_visit(
        &self,
        org_id: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let provider = self.provider.clone();
        Box::pin(async move {
            let mut conn = Self::open(&provider).await?;
            let result = sqlx::query(INSERT_VISIT).bind(&org_id).execute(&mut conn).await.map(|_| ());
            Self::settle(&provider, conn, result).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::INSERT_VISIT;

    #[test]
    fn insert_statement_binds_the_org_id_and_uses_server_time() {
        assert_eq!(INSERT_VISIT, "INSERT INTO visits (orgid, visit_time) VALUES (?, NOW())");
    }
}

pub mod mock {
    //! In-memory storage for tests.
    //!
    //! Tracks existing tables, every DDL statement applied, and every
    //! visit recorded. Failures can be injected per operation to exercise
    //! error paths without a database.

    use std::{
        collections::HashSet,
        future::Future,
        pin::Pin,
        sync::Arc,
    };

    use chrono::Utc;
    use tokio::sync::RwLock;

    use super::VisitStorage;
    use crate::{
        error::{CoreError, Result},
        visits::Visit,
    };

    /// Mock storage with observable state and injectable failures.
    ///
    /// A successful `CREATE TABLE` statement marks its table as existing,
    /// mirroring a real schema: a later statement failing does not undo
    /// it. All state is shared across clones.
    #[derive(Clone)]
    pub struct MemoryVisitStorage {
        tables: Arc<RwLock<HashSet<String>>>,
        applied_ddl: Arc<RwLock<Vec<String>>>,
        visits: Arc<RwLock<Vec<Visit>>>,
        list_error: Arc<RwLock<Option<String>>>,
        visit_error: Arc<RwLock<Option<String>>>,
        ddl_failure: Arc<RwLock<Option<(String, String)>>>,
    }

    impl MemoryVisitStorage {
        /// Creates a new mock with an empty schema.
        pub fn new() -> Self {
            Self {
                tables: Arc::new(RwLock::new(HashSet::new())),
                applied_ddl: Arc::new(RwLock::new(Vec::new())),
                visits: Arc::new(RwLock::new(Vec::new())),
                list_error: Arc::new(RwLock::new(None)),
                visit_error: Arc::new(RwLock::new(None)),
                ddl_failure: Arc::new(RwLock::new(None)),
            }
        }

        /// Marks a table as already existing.
        pub async fn seed_table(&self, name: &str) {
            self.tables.write().await.insert(name.to_string());
        }

        /// Injects an error for the next introspection call.
        pub async fn inject_list_error(&self, message: &str) {
            *self.list_error.write().await = Some(message.to_string());
        }

        /// Injects an error for the next visit insert.
        pub async fn inject_visit_error(&self, message: &str) {
            *self.visit_error.write().await = Some(message.to_string());
        }

        /// Fails every DDL statement containing `needle` until cleared.
        pub async fn fail_statements_matching(&self, needle: &str, message: &str) {
            *self.ddl_failure.write().await = Some((needle.to_string(), message.to_string()));
        }

        /// Tables currently existing, sorted for stable assertions.
        pub async fn existing_tables(&self) -> Vec<String> {
            let mut tables: Vec<String> = self.tables.read().await.iter().cloned().collect();
            tables.sort();
            tables
        }

        /// Every DDL statement applied, in execution order.
        pub async fn applied_ddl(&self) -> Vec<String> {
            self.applied_ddl.read().await.clone()
        }

        /// Every visit recorded, in insertion order.
        pub async fn recorded_visits(&self) -> Vec<Visit> {
            self.visits.read().await.clone()
        }
    }

    impl Default for MemoryVisitStorage {
        fn default() -> Self {
            Self::new()
        }
    }

    fn created_table_name(statement: &str) -> Option<&str> {
        let rest = statement.trim_start().strip_prefix("CREATE TABLE ")?;
        rest.split(|c: char| c.is_whitespace() || c == '(').find(|token| !token.is_empty())
    }

    impl VisitStorage for MemoryVisitStorage {
        fn list_existing_tables(
            &self,
            candidates: Vec<String>,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>> {
            let tables = self.tables.clone();
            let list_error = self.list_error.clone();
            Box::pin(async move {
                if let Some(message) = list_error.write().await.take() {
                    return Err(CoreError::query(message));
                }
                let tables = tables.read().await;
                let mut existing: Vec<String> =
                    candidates.into_iter().filter(|name| tables.contains(name)).collect();
                existing.sort();
                Ok(existing)
            })
        }

        fn execute_ddl(
            &self,
            statement: String,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            let tables = self.tables.clone();
            let applied_ddl = self.applied_ddl.clone();
            let ddl_failure = self.ddl_failure.clone();
            Box::pin(async move {
                if let Some((needle, message)) = ddl_failure.read().await.clone() {
                    if statement.contains(&needle) {
                        return Err(CoreError::query(message));
                    }
                }
                if let Some(name) = created_table_name(&statement) {
                    tables.write().await.insert(name.to_string());
                }
                applied_ddl.write().await.push(statement);
                Ok(())
            })
        }

        fn record_visit(
            &self,
            org_id: String,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            let visits = self.visits.clone();
            let visit_error = self.visit_error.clone();
            Box::pin(async move {
                if let Some(message) = visit_error.write().await.take() {
                    return Err(CoreError::query(message));
                }
                let mut visits = visits.write().await;
                let id = i64::try_from(visits.len() + 1).unwrap_or(i64::MAX);
                visits.push(Visit { id, org_id, visit_time: Utc::now() });
                Ok(())
            })
        }
    }

}
