//! `auditdesk-client`: the REST collaborator.
//!
//! A thin typed layer over the backend's JSON API: cookie session, CSRF
//! token fetch and echo on mutating calls, request timeout, and a single
//! error taxonomy ([`ApiError`]) whose [`ApiError::user_message`] is what the
//! UI shows.
//!
//! View models depend on the [`DirectoryApi`] and [`AuditApi`] traits, not on
//! [`ApiClient`], so they can be driven by in-memory fakes in tests.

mod api;
mod audits;
mod client;
mod directory;
mod error;
mod http;

pub use api::{AuditApi, AuditQuery, DirectoryApi, HistoryNote};
pub use client::{ApiClient, ClientConfig, CSRF_COOKIE, CSRF_HEADER, REQUEST_ID_HEADER};
pub use error::{ApiError, GENERIC_FAILURE};
