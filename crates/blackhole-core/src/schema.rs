//! Static registry of tables and the DDL that creates them.
//!
//! The registry is fixed at build time. Idempotency lives in the
//! provisioning diff, so the statements themselves carry no
//! `IF NOT EXISTS` guards.

/// A table and the ordered statements that create it.
///
/// Statement order is load-bearing: later statements may reference
/// objects created by earlier ones.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Logical table name, matched against the live schema by name only.
    pub name: &'static str,
    /// DDL applied strictly in order.
    pub statements: &'static [&'static str],
}

const CREATE_VISITS_TABLE: &str = "CREATE TABLE visits (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    orgid VARCHAR(18) NOT NULL,
    visit_time DATETIME NOT NULL
)";

const INDEX_VISITS_ORGID: &str = "CREATE INDEX idx_visits_orgid ON visits (orgid)";

/// Tables this service provisions at startup.
pub const REGISTRY: &[TableSpec] = &[TableSpec {
    name: "visits",
    statements: &[CREATE_VISITS_TABLE, INDEX_VISITS_ORGID],
}];

/// Ordered DDL for a table; empty when the name is not registered.
pub fn statements_for(name: &str) -> &'static [&'static str] {
    REGISTRY
        .iter()
        .find(|spec| spec.name == name)
        .map_or(&[], |spec| spec.statements)
}

/// Names of all registered tables, in registry order.
pub fn table_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|spec| spec.name)
}
