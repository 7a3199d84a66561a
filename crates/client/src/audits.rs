use async_trait::async_trait;
use reqwest::Method;

use auditdesk_audits::{AuditDraft, AuditRecord, HistoryEntry, QuestionPatch};
use auditdesk_core::{AuditId, QuestionId};

use crate::api::{AuditApi, AuditQuery, HistoryNote};
use crate::client::ApiClient;
use crate::error::ApiError;

#[async_trait]
impl AuditApi for ApiClient {
    async fn list_audits(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, ApiError> {
        self.get("audits/", &query.to_pairs()).await
    }

    async fn get_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError> {
        self.get(&format!("audits/{id}/"), &[]).await
    }

    async fn timeline(&self, id: AuditId) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get(&format!("audits/{id}/timeline/"), &[]).await
    }

    async fn create_audit(&self, draft: &AuditDraft) -> Result<AuditRecord, ApiError> {
        self.send_json(Method::POST, "audits/", draft).await
    }

    async fn update_audit(&self, id: AuditId, draft: &AuditDraft) -> Result<AuditRecord, ApiError> {
        self.send_json(Method::PUT, &format!("audits/{id}/"), draft).await
    }

    async fn delete_audit(&self, id: AuditId) -> Result<(), ApiError> {
        self.send_unit::<()>(Method::DELETE, &format!("audits/{id}/"), None).await
    }

    async fn start_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError> {
        self.post_empty(&format!("audits/{id}/start/")).await
    }

    async fn submit_for_review(&self, id: AuditId, note: &HistoryNote) -> Result<AuditRecord, ApiError> {
        self.send_json(Method::POST, &format!("audits/{id}/submit/"), note).await
    }

    async fn send_feedback(&self, id: AuditId, note: &HistoryNote) -> Result<AuditRecord, ApiError> {
        self.send_json(Method::POST, &format!("audits/{id}/feedback/"), note).await
    }

    async fn complete_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError> {
        self.post_empty(&format!("audits/{id}/complete/")).await
    }

    async fn update_question(
        &self,
        id: AuditId,
        question: QuestionId,
        patch: &QuestionPatch,
    ) -> Result<AuditRecord, ApiError> {
        self.send_json(Method::PATCH, &format!("audits/{id}/questions/{question}/"), patch)
            .await
    }
}
