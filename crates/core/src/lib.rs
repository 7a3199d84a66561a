//! `auditdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no HTTP, no storage).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod role;
pub mod status;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{AuditId, CompanyId, HistoryEntryId, QuestionId, UserId};
pub use role::Role;
pub use status::AuditStatus;
pub use value_object::{Email, ValueObject};
