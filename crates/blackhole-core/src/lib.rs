//! Database plumbing for the notification sink.
//!
//! Resolves MySQL connection settings from the environment, provisions the
//! schema at startup, and records visiting organizations. The layer is
//! deliberately thin: one connection per operation, no pooling, and writes
//! that are best-effort by contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod error;
pub mod provision;
pub mod schema;
pub mod storage;
pub mod time;
pub mod visits;

pub use config::{has_backend, DbConfig};
pub use connection::{ConnectionProvider, ReconnectPolicy};
pub use error::{CoreError, ProvisioningError, Result, TableFailure};
pub use provision::ProvisioningService;
pub use schema::{TableSpec, REGISTRY};
pub use storage::{MysqlVisitStorage, VisitStorage};
pub use time::{Clock, RealClock, TestClock};
pub use visits::{Visit, VisitLogger};
