//! Startup schema provisioning.
//!
//! One introspection query decides what is missing, then each missing
//! table's DDL runs strictly in order while tables proceed concurrently
//! relative to each other. Failures are aggregated per table and nothing
//! is rolled back.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::{
    error::{ProvisioningError, TableFailure},
    schema::{self, TableSpec},
    storage::VisitStorage,
};

/// Ensures registered tables exist before the service accepts traffic.
pub struct ProvisioningService {
    storage: Arc<dyn VisitStorage>,
    registry: &'static [TableSpec],
}

impl ProvisioningService {
    /// Creates a service provisioning the given registry.
    pub fn new(storage: Arc<dyn VisitStorage>, registry: &'static [TableSpec]) -> Self {
        Self { storage, registry }
    }

    /// Creates a service provisioning the built-in registry.
    pub fn with_default_registry(storage: Arc<dyn VisitStorage>) -> Self {
        Self::new(storage, schema::REGISTRY)
    }

    /// Introspects the schema, diffs it against the registry, and creates
    /// whatever is missing.
    ///
    /// Existence is judged by name only; a table that exists with a
    /// drifted shape is left untouched. An introspection failure aborts
    /// before any DDL runs. Creation failures are collected across tables
    /// and reported together; tables that succeeded stay created.
    pub async fn ensure_schema(&self) -> std::result::Result<(), ProvisioningError> {
        let candidates: Vec<String> =
            self.registry.iter().map(|spec| spec.name.to_string()).collect();
        let existing = self
            .storage
            .list_existing_tables(candidates)
            .await
            .map_err(ProvisioningError::Introspection)?;

        let missing: Vec<&TableSpec> = self
            .registry
            .iter()
            .filter(|spec| !existing.iter().any(|name| name == spec.name))
            .collect();

        if missing.is_empty() {
            debug!("schema is complete, no DDL to issue");
            return Ok(());
        }

        let names: Vec<&str> = missing.iter().map(|spec| spec.name).collect();
        info!(tables = ?names, "creating missing tables");

        let results = join_all(missing.iter().map(|spec| self.create_table(spec))).await;
        let failures: Vec<TableFailure> =
            results.into_iter().filter_map(|result| result.err()).collect();

        if failures.is_empty() {
            info!(tables = ?names, "schema provisioning complete");
            Ok(())
        } else {
            for failure in &failures {
                error!(
                    table = %failure.table,
                    statement = failure.statement_index,
                    error = %failure.source,
                    "table creation failed, earlier statements remain applied"
                );
            }
            Err(ProvisioningError::Creation(failures))
        }
    }

    async fn create_table(&self, spec: &TableSpec) -> std::result::Result<(), TableFailure> {
        for (statement_index, statement) in spec.statements.iter().enumerate() {
            self.storage.execute_ddl((*statement).to_string()).await.map_err(|source| {
                TableFailure { table: spec.name.to_string(), statement_index, source }
            })?;
        }
        debug!(table = spec.name, statements = spec.statements.len(), "table created");
        Ok(())
    }
}
