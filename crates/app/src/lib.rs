//! `auditdesk-app`: the client-side core of the audit desk.
//!
//! Session store, route guards, list views, forms and the audit lifecycle
//! view model, all written against the collaborator traits from
//! `auditdesk-client` so they run the same against the real backend and
//! against in-memory fakes. The `auditdesk` binary is a thin terminal shell
//! over these pieces.

pub mod cli;
pub mod commands;
pub mod config;
pub mod forms;
pub mod lifecycle;
pub mod routes;
pub mod session;
pub mod storage;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, ConfigError};
pub use lifecycle::{AuditWorkflow, WorkflowError};
pub use routes::{Guard, Route, guard, navigation};
pub use session::{SESSION_KEY, SessionError, SessionReader, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
