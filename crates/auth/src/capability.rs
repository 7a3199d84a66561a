//! Centralized capability table.
//!
//! Every view and every collaborator write asks this table what a role may do.
//! Pages never carry their own role checks.

use std::collections::BTreeSet;

use auditdesk_core::{AuditStatus, Role};

use crate::permissions::{Action, AuditAction, Page, QuestionField, Resource};
use crate::principal::Relation;

pub type ActionSet = BTreeSet<Action>;
pub type AuditActionSet = BTreeSet<AuditAction>;
pub type FieldSet = BTreeSet<QuestionField>;

/// Role × resource → permitted actions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityTable;

impl CapabilityTable {
    pub const fn new() -> Self {
        Self
    }

    /// Whether `role` may open `page` at all. Row-level scoping happens later.
    pub fn page_visible(&self, role: Role, page: Page) -> bool {
        match page {
            Page::Dashboard | Page::Companies | Page::Audits | Page::AuditDetail | Page::Profile => {
                true
            }
            Page::Questionnaire => matches!(role, Role::Expert | Role::Participant),
            Page::Users => role == Role::Admin,
            Page::Reports => matches!(role, Role::Expert | Role::Admin),
        }
    }

    pub fn visible_pages(&self, role: Role) -> Vec<Page> {
        Page::ALL
            .into_iter()
            .filter(|page| self.page_visible(role, *page))
            .collect()
    }

    /// CRUD actions on a directory resource.
    ///
    /// Company and user mutation is admin-only; the single exception is a
    /// user updating their own profile.
    pub fn resource_actions(&self, role: Role, resource: Resource, relation: Relation) -> ActionSet {
        use Action::*;

        let granted: &[Action] = match (role, resource) {
            (Role::Admin, _) => &[View, Create, Update, Delete],

            (Role::Expert, Resource::Company) => &[View],
            (Role::Participant, Resource::Company) if relation.is_owner() => &[View],

            (Role::Expert | Role::Participant, Resource::User) if relation.is_owner() => {
                &[View, Update]
            }
            (Role::Expert, Resource::User) => &[View],

            (Role::Expert, Resource::Audit) if relation.is_owner() => &[View, Create, Update],
            (Role::Expert, Resource::Audit) => &[View, Create],
            (Role::Participant, Resource::Audit) if relation.is_owner() => &[View],

            (Role::Participant, _) => &[],
        };

        granted.iter().copied().collect()
    }

    pub fn can(&self, role: Role, resource: Resource, relation: Relation, action: Action) -> bool {
        self.resource_actions(role, resource, relation).contains(&action)
    }

    /// Legal actions on one audit given its status.
    ///
    /// | status      | expert (owner)               | participant (owner) | admin        |
    /// |-------------|------------------------------|---------------------|--------------|
    /// | Planned     | start, edit                  | –                   | edit, delete |
    /// | In Progress | send-feedback, complete, edit| submit-for-review   | edit, delete |
    /// | Completed   | –                            | –                   | delete       |
    ///
    /// Experts and participants who are not assigned to the audit get nothing.
    pub fn audit_actions(&self, role: Role, status: AuditStatus, relation: Relation) -> AuditActionSet {
        use AuditAction::*;

        let granted: &[AuditAction] = match (role, status) {
            (Role::Admin, AuditStatus::Completed) => &[Delete],
            (Role::Admin, _) => &[Edit, Delete],

            _ if !relation.is_owner() => &[],

            (Role::Expert, AuditStatus::Planned) => &[Start, Edit],
            (Role::Expert, AuditStatus::InProgress) => &[SendFeedback, Complete, Edit],
            (Role::Participant, AuditStatus::InProgress) => &[SubmitForReview],
            (Role::Expert | Role::Participant, _) => &[],
        };

        granted.iter().copied().collect()
    }

    /// Question fields the role may write. Only while the audit is in progress.
    pub fn question_fields(&self, role: Role, status: AuditStatus, relation: Relation) -> FieldSet {
        if status != AuditStatus::InProgress || !relation.is_owner() {
            return FieldSet::new();
        }

        let fields: &[QuestionField] = match role {
            Role::Participant => &[QuestionField::Response, QuestionField::Evidence],
            Role::Expert => &[QuestionField::Status, QuestionField::Recommendation],
            Role::Admin => &[],
        };

        fields.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AuditAction::*;

    const TABLE: CapabilityTable = CapabilityTable::new();

    fn set(actions: &[AuditAction]) -> AuditActionSet {
        actions.iter().copied().collect()
    }

    #[test]
    fn audit_actions_match_lifecycle_table_for_every_role_and_status() {
        let expected = [
            (Role::Expert, AuditStatus::Planned, set(&[Start, Edit])),
            (Role::Expert, AuditStatus::InProgress, set(&[SendFeedback, Complete, Edit])),
            (Role::Expert, AuditStatus::Completed, set(&[])),
            (Role::Participant, AuditStatus::Planned, set(&[])),
            (Role::Participant, AuditStatus::InProgress, set(&[SubmitForReview])),
            (Role::Participant, AuditStatus::Completed, set(&[])),
            (Role::Admin, AuditStatus::Planned, set(&[Edit, Delete])),
            (Role::Admin, AuditStatus::InProgress, set(&[Edit, Delete])),
            (Role::Admin, AuditStatus::Completed, set(&[Delete])),
        ];

        for (role, status, actions) in expected {
            assert_eq!(
                TABLE.audit_actions(role, status, Relation::Owner),
                actions,
                "{role} / {status}"
            );
        }
    }

    #[test]
    fn unassigned_experts_and_participants_get_no_audit_actions() {
        for status in AuditStatus::ALL {
            assert!(TABLE.audit_actions(Role::Expert, status, Relation::Other).is_empty());
            assert!(TABLE.audit_actions(Role::Participant, status, Relation::Other).is_empty());
        }
        assert_eq!(
            TABLE.audit_actions(Role::Admin, AuditStatus::Planned, Relation::Other),
            set(&[Edit, Delete])
        );
    }

    #[test]
    fn only_admin_mutates_companies_and_users() {
        for role in [Role::Expert, Role::Participant] {
            for action in [Action::Create, Action::Delete] {
                assert!(!TABLE.can(role, Resource::Company, Relation::Other, action));
                assert!(!TABLE.can(role, Resource::User, Relation::Other, action));
            }
            assert!(!TABLE.can(role, Resource::Company, Relation::Owner, Action::Update));
        }
        for action in Action::ALL {
            assert!(TABLE.can(Role::Admin, Resource::Company, Relation::Other, action));
            assert!(TABLE.can(Role::Admin, Resource::User, Relation::Other, action));
        }
    }

    #[test]
    fn users_may_update_their_own_profile_only() {
        assert!(TABLE.can(Role::Participant, Resource::User, Relation::Owner, Action::Update));
        assert!(!TABLE.can(Role::Participant, Resource::User, Relation::Other, Action::Update));
        assert!(!TABLE.can(Role::Expert, Resource::User, Relation::Other, Action::Update));
    }

    #[test]
    fn participants_see_only_their_company() {
        assert!(TABLE.can(Role::Participant, Resource::Company, Relation::Owner, Action::View));
        assert!(!TABLE.can(Role::Participant, Resource::Company, Relation::Other, Action::View));
    }

    #[test]
    fn users_page_is_admin_only() {
        assert!(TABLE.page_visible(Role::Admin, Page::Users));
        assert!(!TABLE.page_visible(Role::Expert, Page::Users));
        assert!(!TABLE.page_visible(Role::Participant, Page::Users));
        assert!(!TABLE.visible_pages(Role::Participant).contains(&Page::Reports));
    }

    #[test]
    fn question_fields_split_between_participant_and_expert() {
        let participant = TABLE.question_fields(Role::Participant, AuditStatus::InProgress, Relation::Owner);
        assert!(participant.contains(&QuestionField::Response));
        assert!(participant.contains(&QuestionField::Evidence));
        assert!(!participant.contains(&QuestionField::Status));

        let expert = TABLE.question_fields(Role::Expert, AuditStatus::InProgress, Relation::Owner);
        assert!(expert.contains(&QuestionField::Status));
        assert!(expert.contains(&QuestionField::Recommendation));
        assert!(!expert.contains(&QuestionField::Response));

        for status in [AuditStatus::Planned, AuditStatus::Completed] {
            assert!(TABLE.question_fields(Role::Participant, status, Relation::Owner).is_empty());
            assert!(TABLE.question_fields(Role::Expert, status, Relation::Owner).is_empty());
        }
    }
}
