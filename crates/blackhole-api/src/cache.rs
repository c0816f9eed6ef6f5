//! The acknowledgement payload, read once at startup.

use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use tracing::info;

/// Fixed response body served for every request.
///
/// Loaded from disk exactly once at startup; a missing or unreadable
/// file is fatal then, never at request time. Cloning is cheap — the
/// bytes are shared.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    body: Bytes,
}

impl ResponseCache {
    /// Reads the payload file into memory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path)
            .with_context(|| format!("Failed to read response payload {}", path.display()))?;
        info!(path = %path.display(), bytes = contents.len(), "response payload cached");
        Ok(Self { body: Bytes::from(contents) })
    }

    /// Builds a cache from bytes already in memory. Used by tests.
    pub fn from_bytes(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// The cached payload.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}
