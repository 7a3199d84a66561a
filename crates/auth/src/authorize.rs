use serde::Serialize;
use thiserror::Error;

use auditdesk_core::{AuditStatus, Role};

use crate::capability::CapabilityTable;
use crate::permissions::{Action, AuditAction, Page, Resource};
use crate::principal::{Principal, Relation};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {role} may not {action} {resource}")]
    Forbidden {
        role: Role,
        action: &'static str,
        resource: &'static str,
    },

    #[error("forbidden: {role} may not {action} an audit that is {status}")]
    IllegalForStatus {
        role: Role,
        action: AuditAction,
        status: AuditStatus,
    },

    #[error("page not available for role {0}")]
    PageHidden(Role),
}

/// Authorize a CRUD action on a directory resource.
///
/// - No IO
/// - No panics
pub fn authorize(
    principal: &Principal,
    resource: Resource,
    relation: Relation,
    action: Action,
) -> Result<(), AuthzError> {
    if CapabilityTable::new().can(principal.role, resource, relation, action) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            action: action.as_str(),
            resource: resource.as_str(),
        })
    }
}

/// Authorize a lifecycle/management action on an audit in its current status.
pub fn authorize_audit(
    principal: &Principal,
    status: AuditStatus,
    relation: Relation,
    action: AuditAction,
) -> Result<(), AuthzError> {
    let allowed = CapabilityTable::new().audit_actions(principal.role, status, relation);
    if allowed.contains(&action) {
        return Ok(());
    }

    if relation.is_owner() || principal.is_admin() {
        Err(AuthzError::IllegalForStatus {
            role: principal.role,
            action,
            status,
        })
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            action: action.as_str(),
            resource: "an audit they are not assigned to",
        })
    }
}

pub fn authorize_page(role: Role, page: Page) -> Result<(), AuthzError> {
    if CapabilityTable::new().page_visible(role, page) {
        Ok(())
    } else {
        Err(AuthzError::PageHidden(role))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why an audit action was (or would be) allowed or denied.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub requested: AuditAction,
    pub granted: bool,
    pub reason: String,
    pub role: Role,
    pub status: AuditStatus,
    pub relation: Relation,
    /// Everything the principal may do on this audit right now.
    pub available: Vec<AuditAction>,
    pub suggestions: Vec<String>,
}

/// Explain an audit authorization decision.
///
/// Answers "why can't I press this button?" with the role, the audit status,
/// the ownership relation and the actions that are available instead.
pub fn explain_authorization(
    principal: &Principal,
    status: AuditStatus,
    relation: Relation,
    requested: AuditAction,
) -> AuthorizationExplanation {
    let table = CapabilityTable::new();
    let available: Vec<AuditAction> = table
        .audit_actions(principal.role, status, relation)
        .into_iter()
        .collect();
    let granted = available.contains(&requested);

    let mut suggestions = Vec::new();
    let reason = if granted {
        format!("{} may {} an audit that is {}", principal.role, requested, status)
    } else if !relation.is_owner() && !principal.is_admin() {
        suggestions.push("Ask an admin to assign you to this audit".to_string());
        format!("{} is not assigned to this audit", principal.role)
    } else {
        let roles_allowed: Vec<&str> = Role::ALL
            .into_iter()
            .filter(|r| table.audit_actions(*r, status, Relation::Owner).contains(&requested))
            .map(|r| r.as_str())
            .collect();
        if roles_allowed.is_empty() {
            suggestions.push(format!("'{requested}' is not available while the audit is {status}"));
        } else {
            suggestions.push(format!(
                "While {status}, '{requested}' is performed by: {}",
                roles_allowed.join(", ")
            ));
        }
        format!("{} may not {} an audit that is {}", principal.role, requested, status)
    };

    AuthorizationExplanation {
        requested,
        granted,
        reason,
        role: principal.role,
        status,
        relation,
        available,
        suggestions,
    }
}
