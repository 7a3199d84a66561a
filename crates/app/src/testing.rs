//! In-memory collaborator for view-model tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use auditdesk_audits::{AuditDraft, AuditRecord, HistoryEntry, HistoryKind, QuestionPatch};
use auditdesk_client::{ApiError, AuditApi, AuditQuery, DirectoryApi, HistoryNote};
use auditdesk_core::{AuditId, AuditStatus, CompanyId, HistoryEntryId, QuestionId, UserId};
use auditdesk_directory::{
    Company, CompanyDraft, Credentials, PasswordChange, ProfilePatch, User, UserDraft,
};

pub(crate) const PASSWORD: &str = "secret-pass";

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub users: Mutex<Vec<User>>,
    pub companies: Mutex<Vec<Company>>,
    pub audits: Mutex<Vec<AuditRecord>>,
    pub calls: Mutex<Vec<String>>,
    failure: Mutex<Option<ApiError>>,
    next_id: AtomicU64,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        }
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, call: &str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call.to_string());
        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn not_found() -> ApiError {
        ApiError::Request {
            status: 404,
            message: "Not found.".to_string(),
        }
    }

    fn with_audit(
        &self,
        id: AuditId,
        f: impl FnOnce(&mut AuditRecord, u64) -> Result<(), ApiError>,
    ) -> Result<AuditRecord, ApiError> {
        let entry_id = self.next_id();
        let mut audits = self.audits.lock().unwrap();
        let audit = audits.iter_mut().find(|a| a.id == id).ok_or_else(Self::not_found)?;
        f(audit, entry_id)?;
        Ok(audit.clone())
    }
}

fn entry(id: u64, kind: HistoryKind, content: &str, files: &[String]) -> HistoryEntry {
    HistoryEntry {
        id: HistoryEntryId::new(id),
        date: Utc::now(),
        kind,
        content: content.to_string(),
        files: files.to_vec(),
        author: None,
    }
}

#[async_trait]
impl DirectoryApi for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        self.enter("login")?;
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| u.username == credentials.username && credentials.password == PASSWORD)
            .cloned()
            .ok_or_else(|| ApiError::Request {
                status: 400,
                message: "Invalid credentials.".to_string(),
            })
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.enter("list_users")?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        self.enter("get_user")?;
        let users = self.users.lock().unwrap();
        users.iter().find(|u| u.id == id).cloned().ok_or_else(Self::not_found)
    }

    async fn create_user(&self, draft: &UserDraft) -> Result<User, ApiError> {
        self.enter("create_user")?;
        let user = User {
            id: UserId::new(self.next_id()),
            username: draft.username.clone(),
            email: draft.email.clone(),
            role: draft.role,
            organization: draft.organization,
            phone: draft.phone.clone(),
            first_name: String::new(),
            last_name: String::new(),
            date_joined: Some(Utc::now()),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, draft: &UserDraft) -> Result<User, ApiError> {
        self.enter("update_user")?;
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id).ok_or_else(Self::not_found)?;
        user.username = draft.username.clone();
        user.email = draft.email.clone();
        user.role = draft.role;
        user.organization = draft.organization;
        user.phone = draft.phone.clone();
        Ok(user.clone())
    }

    async fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> Result<User, ApiError> {
        self.enter("update_profile")?;
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id).ok_or_else(Self::not_found)?;
        patch.apply_to(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        self.enter("delete_user")?;
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }

    async fn change_password(&self, _id: UserId, change: &PasswordChange) -> Result<(), ApiError> {
        self.enter("change_password")?;
        if change.old_password != PASSWORD {
            return Err(ApiError::Request {
                status: 400,
                message: "old_password: Wrong password.".to_string(),
            });
        }
        Ok(())
    }

    async fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.enter("list_companies")?;
        Ok(self.companies.lock().unwrap().clone())
    }

    async fn get_company(&self, id: CompanyId) -> Result<Company, ApiError> {
        self.enter("get_company")?;
        let companies = self.companies.lock().unwrap();
        companies.iter().find(|c| c.id == id).cloned().ok_or_else(Self::not_found)
    }

    async fn create_company(&self, draft: &CompanyDraft) -> Result<Company, ApiError> {
        self.enter("create_company")?;
        let company = Company {
            id: CompanyId::new(self.next_id()),
            name: draft.name.clone(),
            industry: draft.industry.clone(),
            size: draft.size.clone(),
            location: draft.location.clone(),
            contact: draft.contact.clone(),
            description: draft.description.clone(),
            created_at: Some(Utc::now()),
        };
        self.companies.lock().unwrap().push(company.clone());
        Ok(company)
    }

    async fn update_company(&self, id: CompanyId, draft: &CompanyDraft) -> Result<Company, ApiError> {
        self.enter("update_company")?;
        let mut companies = self.companies.lock().unwrap();
        let company = companies.iter_mut().find(|c| c.id == id).ok_or_else(Self::not_found)?;
        company.name = draft.name.clone();
        company.industry = draft.industry.clone();
        company.size = draft.size.clone();
        company.location = draft.location.clone();
        company.contact = draft.contact.clone();
        company.description = draft.description.clone();
        Ok(company.clone())
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), ApiError> {
        self.enter("delete_company")?;
        self.companies.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

#[async_trait]
impl AuditApi for FakeBackend {
    async fn list_audits(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, ApiError> {
        self.enter("list_audits")?;
        let audits = self.audits.lock().unwrap();
        Ok(audits
            .iter()
            .filter(|a| query.status.is_none_or(|s| a.status == s))
            .filter(|a| query.company.is_none_or(|c| a.company == c))
            .cloned()
            .collect())
    }

    async fn get_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError> {
        self.enter("get_audit")?;
        let audits = self.audits.lock().unwrap();
        audits.iter().find(|a| a.id == id).cloned().ok_or_else(Self::not_found)
    }

    async fn timeline(&self, id: AuditId) -> Result<Vec<HistoryEntry>, ApiError> {
        self.enter("timeline")?;
        self.get_audit_unlogged(id).map(|a| a.history)
    }

    async fn create_audit(&self, draft: &AuditDraft) -> Result<AuditRecord, ApiError> {
        self.enter("create_audit")?;
        let record = AuditRecord {
            id: AuditId::new(self.next_id()),
            name: draft.name.clone(),
            company: draft.company,
            company_name: None,
            expert: draft.expert,
            participant: draft.participant,
            status: AuditStatus::Planned,
            completion: 0,
            start_date: draft.start_date,
            end_date: draft.end_date,
            created_at: Some(Utc::now()),
            questions: Vec::new(),
            history: Vec::new(),
        };
        self.audits.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_audit(&self, id: AuditId, draft: &AuditDraft) -> Result<AuditRecord, ApiError> {
        self.enter("update_audit")?;
        self.with_audit(id, |a, _| {
            a.name = draft.name.clone();
            a.expert = draft.expert;
            a.participant = draft.participant;
            a.start_date = draft.start_date;
            a.end_date = draft.end_date;
            Ok(())
        })
    }

    async fn delete_audit(&self, id: AuditId) -> Result<(), ApiError> {
        self.enter("delete_audit")?;
        self.audits.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    async fn start_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError> {
        self.enter("start_audit")?;
        self.with_audit(id, |a, eid| {
            a.status = AuditStatus::InProgress;
            a.history.push(entry(eid, HistoryKind::StatusChange, "Planned -> In Progress", &[]));
            Ok(())
        })
    }

    async fn submit_for_review(&self, id: AuditId, note: &HistoryNote) -> Result<AuditRecord, ApiError> {
        self.enter("submit_for_review")?;
        self.with_audit(id, |a, eid| {
            a.history.push(entry(eid, HistoryKind::Submission, &note.content, &note.files));
            Ok(())
        })
    }

    async fn send_feedback(&self, id: AuditId, note: &HistoryNote) -> Result<AuditRecord, ApiError> {
        self.enter("send_feedback")?;
        self.with_audit(id, |a, eid| {
            a.history.push(entry(eid, HistoryKind::Feedback, &note.content, &note.files));
            Ok(())
        })
    }

    async fn complete_audit(&self, id: AuditId) -> Result<AuditRecord, ApiError> {
        self.enter("complete_audit")?;
        self.with_audit(id, |a, eid| {
            a.status = AuditStatus::Completed;
            a.completion = 100;
            a.history.push(entry(eid, HistoryKind::StatusChange, "In Progress -> Completed", &[]));
            Ok(())
        })
    }

    async fn update_question(
        &self,
        id: AuditId,
        question: QuestionId,
        patch: &QuestionPatch,
    ) -> Result<AuditRecord, ApiError> {
        self.enter("update_question")?;
        self.with_audit(id, |a, _| {
            let q = a
                .questions
                .iter_mut()
                .find(|q| q.id == question)
                .ok_or_else(FakeBackend::not_found)?;
            *q = patch.preview(q).map_err(|e| ApiError::Request {
                status: 400,
                message: e.to_string(),
            })?;
            Ok(())
        })
    }
}

impl FakeBackend {
    fn get_audit_unlogged(&self, id: AuditId) -> Result<AuditRecord, ApiError> {
        let audits = self.audits.lock().unwrap();
        audits.iter().find(|a| a.id == id).cloned().ok_or_else(Self::not_found)
    }
}
