use serde::Serialize;

use auditdesk_core::Role;

use crate::capability::CapabilityTable;
use crate::permissions::Page;

/// Human-readable description of a role and the screens it can open.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub role: Role,
    pub description: &'static str,
    pub pages: Vec<Page>,
}

pub fn describe(role: Role) -> RoleDefinition {
    let description = match role {
        Role::Expert => "Creates and runs audits and evaluates participant submissions",
        Role::Participant => "Answers questionnaires for their own company's audits",
        Role::Admin => "Manages users and companies",
    };

    RoleDefinition {
        role,
        description,
        pages: CapabilityTable::new().visible_pages(role),
    }
}
