use serde::{Deserialize, Serialize};

use auditdesk_core::{CompanyId, Role, UserId};

/// The acting identity for an authorization decision.
///
/// Built from the session snapshot; carries only what policy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    /// Company a participant belongs to. `None` for experts and admins.
    pub organization: Option<CompanyId>,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role, organization: Option<CompanyId>) -> Self {
        Self {
            user_id,
            role,
            organization,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// How the principal relates to the record being acted on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The principal is the record's assigned expert/participant, or the record is theirs.
    Owner,
    Other,
}

impl Relation {
    pub fn from_bool(is_owner: bool) -> Self {
        if is_owner { Relation::Owner } else { Relation::Other }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Relation::Owner)
    }
}

/// Records that have assigned people (audits).
pub trait Assigned {
    fn expert(&self) -> Option<UserId>;
    fn participant(&self) -> Option<UserId>;
}

/// Relation of `principal` to an assigned record.
///
/// Experts own the audits they run; participants own the audits assigned to
/// them. Admins act on every record without an ownership relation.
pub fn relation_to<T: Assigned>(principal: &Principal, record: &T) -> Relation {
    let assignee = match principal.role {
        Role::Expert => record.expert(),
        Role::Participant => record.participant(),
        Role::Admin => None,
    };
    Relation::from_bool(assignee == Some(principal.user_id))
}
