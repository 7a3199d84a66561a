//! Directory data model: companies and user accounts.
//!
//! Read models mirror the backend's JSON payloads; drafts and patches are the
//! write payloads, validated against directory invariants before they leave
//! the client.

pub mod company;
pub mod user;

pub use company::{Company, CompanyDraft, ContactInfo};
pub use user::{Credentials, PasswordChange, ProfilePatch, User, UserDraft};
