//! HTTP surface of the notification sink.
//!
//! Serves a cached XML acknowledgement for every request and, when a
//! database backend is configured, records the organization behind each
//! POST notification. The acknowledgement never depends on the outcome
//! of that write.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod server;

pub use cache::ResponseCache;
pub use config::Config;
pub use extract::extract_org_id;
pub use server::{create_router, start_server, AppState};
