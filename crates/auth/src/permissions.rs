use serde::{Deserialize, Serialize};

/// A directory resource that can be listed and mutated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Company,
    User,
    Audit,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Company => "company",
            Resource::User => "user",
            Resource::Audit => "audit",
        }
    }
}

/// CRUD action on a directory resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Lifecycle or management action on a single audit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Start,
    SubmitForReview,
    SendFeedback,
    Complete,
    Edit,
    Delete,
}

impl AuditAction {
    pub const ALL: [AuditAction; 6] = [
        AuditAction::Start,
        AuditAction::SubmitForReview,
        AuditAction::SendFeedback,
        AuditAction::Complete,
        AuditAction::Edit,
        AuditAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Start => "start",
            AuditAction::SubmitForReview => "submit-for-review",
            AuditAction::SendFeedback => "send-feedback",
            AuditAction::Complete => "complete",
            AuditAction::Edit => "edit",
            AuditAction::Delete => "delete",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level screens of the application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Companies,
    Audits,
    AuditDetail,
    Questionnaire,
    Users,
    Reports,
    Profile,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Dashboard,
        Page::Companies,
        Page::Audits,
        Page::AuditDetail,
        Page::Questionnaire,
        Page::Users,
        Page::Reports,
        Page::Profile,
    ];
}

/// Editable field of an audit question.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionField {
    Response,
    Evidence,
    Status,
    Recommendation,
}
