//! `auditdesk-auth`: role-based access control, pure and IO-free.
//!
//! One capability table answers every "may this role do that?" question:
//! page visibility, directory CRUD, audit lifecycle actions, question field
//! rights, and row-level organization scoping.

pub mod authorize;
pub mod capability;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod scope;

pub use authorize::{
    AuthorizationExplanation, AuthzError, authorize, authorize_audit, authorize_page,
    explain_authorization,
};
pub use capability::{ActionSet, AuditActionSet, CapabilityTable, FieldSet};
pub use permissions::{Action, AuditAction, Page, QuestionField, Resource};
pub use principal::{Assigned, Principal, Relation, relation_to};
pub use roles::{RoleDefinition, describe};
pub use scope::{Scope, Scoped};
