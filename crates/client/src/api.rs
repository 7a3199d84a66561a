use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use auditdesk_audits::{AuditDraft, AuditRecord, HistoryEntry, QuestionPatch};
use auditdesk_core::{AuditId, AuditStatus, CompanyId, QuestionId, UserId};
use auditdesk_directory::{
    Company, CompanyDraft, Credentials, PasswordChange, ProfilePatch, User, UserDraft,
};

use crate::error::ApiError;

/// Users, companies and authentication.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// `POST /users/login/`; the backend answers with the identity payload.
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn get_user(&self, id: UserId) -> Result<User, ApiError>;
    /// Also used by self-registration.
    async fn create_user(&self, draft: &UserDraft) -> Result<User, ApiError>;
    async fn update_user(&self, id: UserId, draft: &UserDraft) -> Result<User, ApiError>;
    /// `PATCH /users/{id}/` with only the changed profile fields.
    async fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> Result<User, ApiError>;
    async fn delete_user(&self, id: UserId) -> Result<(), ApiError>;
    async fn change_password(&self, id: UserId, change: &PasswordChange) -> Result<(), ApiError>;

    async fn list_companies(&self) -> Result<Vec<Company>, ApiError>;
    async fn get_company(&self, id: CompanyId) -> Result<Company, ApiError>;
    async fn create_company(&self, draft: &CompanyDraft) -> Result<Company, ApiError>;
    async fn update_company(&self, id: CompanyId, draft: &CompanyDraft) -> Result<Company, ApiError>;
    async fn delete_company(&self, id: CompanyId) -> Result<(), ApiError>;
}

/// Audits, their lifecycle actions, questionnaire and timeline.
///
/// Lifecycle calls return the server's updated audit; callers apply local
/// state only after they succeed.
#[async_trait]
pub trait AuditApi: Send + Sync {
    async fn list_audits(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, ApiError>;
    async fn get_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError>;
    async fn timeline(&self, id: AuditId) -> Result<Vec<HistoryEntry>, ApiError>;

    async fn create_audit(&self, draft: &AuditDraft) -> Result<AuditRecord, ApiError>;
    async fn update_audit(&self, id: AuditId, draft: &AuditDraft) -> Result<AuditRecord, ApiError>;
    async fn delete_audit(&self, id: AuditId) -> Result<(), ApiError>;

    async fn start_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError>;
    async fn submit_for_review(&self, id: AuditId, note: &HistoryNote) -> Result<AuditRecord, ApiError>;
    async fn send_feedback(&self, id: AuditId, note: &HistoryNote) -> Result<AuditRecord, ApiError>;
    async fn complete_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError>;
    async fn update_question(
        &self,
        id: AuditId,
        question: QuestionId,
        patch: &QuestionPatch,
    ) -> Result<AuditRecord, ApiError>;
}

/// Body of submission and feedback calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryNote {
    pub content: String,
    /// File references; upload is handled elsewhere.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Server-side filters for `GET /audits/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQuery {
    pub status: Option<AuditStatus>,
    pub company: Option<CompanyId>,
    pub expert: Option<UserId>,
    pub participant: Option<UserId>,
    pub search: Option<String>,
}

impl AuditQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(company) = self.company {
            pairs.push(("company", company.to_string()));
        }
        if let Some(expert) = self.expert {
            pairs.push(("expert", expert.to_string()));
        }
        if let Some(participant) = self.participant {
            pairs.push(("participant", participant.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_pairs_skip_unset_and_blank_filters() {
        let query = AuditQuery {
            status: Some(AuditStatus::InProgress),
            company: Some(CompanyId::new(3)),
            search: Some("   ".to_string()),
            ..AuditQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![("status", "In Progress".to_string()), ("company", "3".to_string())]
        );
    }
}
