//! Visit recording.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{error::Result, storage::VisitStorage};

/// One recorded notification visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Auto-assigned monotonic identifier.
    pub id: i64,
    /// Organization identifier as received; the column bounds it to 18
    /// characters.
    pub org_id: String,
    /// Server-side timestamp of the visit.
    pub visit_time: DateTime<Utc>,
}

/// Records one row per accepted notification.
///
/// Writes are best-effort by contract: the caller logs a failure and
/// moves on, and the acknowledgement being prepared is never affected.
#[derive(Clone)]
pub struct VisitLogger {
    storage: Arc<dyn VisitStorage>,
}

impl VisitLogger {
    /// Creates a logger writing through the given storage.
    pub fn new(storage: Arc<dyn VisitStorage>) -> Self {
        Self { storage }
    }

    /// Records a visit for the given organization.
    ///
    /// The identifier reaches the database as a bind parameter and the
    /// timestamp is taken server-side, so the statement shape never
    /// varies with the input.
    pub async fn log_visit(&self, org_id: &str) -> Result<()> {
        debug!(org_id, "recording visit");
        self.storage.record_visit(org_id.to_string()).await
    }
}
