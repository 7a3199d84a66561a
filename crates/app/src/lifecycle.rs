//! Audit lifecycle view model.
//!
//! Every action is checked locally by the aggregate first, then sent to the
//! collaborator. Local state changes only after the write succeeds, so a
//! failed call leaves status, completion and history exactly as they were.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use auditdesk_audits::{
    Audit, AuditCommand, AuditDraft, AuditRecord, Complete, EditDetails, QuestionPatch,
    SendFeedback, Start, SubmitForReview, UpdateQuestion,
};
use auditdesk_auth::{
    AuditAction, AuthorizationExplanation, CapabilityTable, FieldSet, Principal, Scope,
    authorize_audit, explain_authorization,
};
use auditdesk_client::{ApiError, AuditApi, HistoryNote};
use auditdesk_core::{Aggregate, AggregateRoot, AuditId, DomainError, QuestionId};

use crate::session::SessionReader;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::NotSignedIn => "Please log in to continue.".to_string(),
            WorkflowError::Domain(err) => err.user_message(),
            WorkflowError::Api(err) => err.user_message(),
        }
    }
}

pub struct AuditWorkflow {
    api: Arc<dyn AuditApi>,
    session: SessionReader,
    audit: Audit,
    last_error: Option<String>,
}

impl AuditWorkflow {
    /// Fetch the audit and its timeline. Participants cannot open audits of
    /// other organizations.
    pub async fn load(
        api: Arc<dyn AuditApi>,
        session: SessionReader,
        id: AuditId,
    ) -> Result<Self, WorkflowError> {
        let principal = session.principal().ok_or(WorkflowError::NotSignedIn)?;

        let record = api.get_audit(id).await?;
        if !Scope::for_principal(&principal).admits(&record) {
            return Err(DomainError::not_found().into());
        }

        let mut audit = Audit::hydrate(record);
        let history = api.timeline(id).await?;
        audit.merge_history(&history);

        Ok(Self {
            api,
            session,
            audit,
            last_error: None,
        })
    }

    pub fn audit(&self) -> &Audit {
        &self.audit
    }

    pub fn snapshot(&self) -> AuditRecord {
        self.audit.snapshot()
    }

    /// Message of the last failed action, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn available_actions(&self) -> Vec<AuditAction> {
        self.session
            .principal()
            .map(|p| self.audit.available_actions(&p))
            .unwrap_or_default()
    }

    /// Why the signed-in user may or may not take `action` right now.
    pub fn explain(&self, action: AuditAction) -> Option<AuthorizationExplanation> {
        let principal = self.session.principal()?;
        Some(explain_authorization(
            &principal,
            self.audit.status(),
            self.audit.relation_of(&principal),
            action,
        ))
    }

    /// Question fields the signed-in user may edit right now.
    pub fn writable_fields(&self) -> FieldSet {
        match self.session.principal() {
            Some(p) => CapabilityTable::new().question_fields(
                p.role,
                self.audit.status(),
                self.audit.relation_of(&p),
            ),
            None => FieldSet::new(),
        }
    }

    fn actor(&self) -> Result<Principal, WorkflowError> {
        self.session.principal().ok_or(WorkflowError::NotSignedIn)
    }

    pub async fn start(&mut self) -> Result<(), WorkflowError> {
        let actor = self.actor()?;
        self.run(AuditCommand::Start(Start {
            actor,
            occurred_at: Utc::now(),
        }))
        .await
    }

    pub async fn submit_for_review(&mut self, note: HistoryNote) -> Result<(), WorkflowError> {
        let actor = self.actor()?;
        self.run(AuditCommand::SubmitForReview(SubmitForReview {
            actor,
            content: note.content,
            files: note.files,
            occurred_at: Utc::now(),
        }))
        .await
    }

    pub async fn send_feedback(&mut self, note: HistoryNote) -> Result<(), WorkflowError> {
        let actor = self.actor()?;
        self.run(AuditCommand::SendFeedback(SendFeedback {
            actor,
            content: note.content,
            files: note.files,
            occurred_at: Utc::now(),
        }))
        .await
    }

    pub async fn complete(&mut self) -> Result<(), WorkflowError> {
        let actor = self.actor()?;
        self.run(AuditCommand::Complete(Complete {
            actor,
            occurred_at: Utc::now(),
        }))
        .await
    }

    pub async fn update_question(
        &mut self,
        question_id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<(), WorkflowError> {
        let actor = self.actor()?;
        self.run(AuditCommand::UpdateQuestion(UpdateQuestion {
            actor,
            question_id,
            patch,
            occurred_at: Utc::now(),
        }))
        .await
    }

    pub async fn edit(&mut self, draft: AuditDraft) -> Result<(), WorkflowError> {
        let actor = self.actor()?;
        self.run(AuditCommand::EditDetails(EditDetails {
            actor,
            draft,
            occurred_at: Utc::now(),
        }))
        .await
    }

    /// Delete the audit. Consumes the view model on success.
    pub async fn delete(mut self) -> Result<(), (Self, WorkflowError)> {
        let result = async {
            let actor = self.actor()?;
            authorize_audit(
                &actor,
                self.audit.status(),
                self.audit.relation_of(&actor),
                AuditAction::Delete,
            )
            .map_err(|e| DomainError::unauthorized(e.to_string()))?;
            self.api.delete_audit(*self.audit.id()).await?;
            Ok::<(), WorkflowError>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!(audit_id = %self.audit.id(), "audit deleted");
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.user_message());
                Err((self, err))
            }
        }
    }

    /// Re-fetch the audit and fold it in without regressing local state.
    pub async fn refresh(&mut self) -> Result<(), WorkflowError> {
        let id = *self.audit.id();
        let result = async {
            let record = self.api.get_audit(id).await?;
            let history = self.api.timeline(id).await?;
            Ok::<_, WorkflowError>((record, history))
        }
        .await;

        match result {
            Ok((record, history)) => {
                self.audit.absorb(&record)?;
                self.audit.merge_history(&history);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    async fn run(&mut self, command: AuditCommand) -> Result<(), WorkflowError> {
        let action = action_name(&command);
        match self.execute(command).await {
            Ok(()) => {
                self.last_error = None;
                info!(
                    audit_id = %self.audit.id(),
                    action,
                    status = %self.audit.status(),
                    completion = self.audit.completion(),
                    "audit action applied"
                );
                Ok(())
            }
            Err(err) => {
                warn!(audit_id = %self.audit.id(), action, error = %err, "audit action failed");
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    async fn execute(&mut self, command: AuditCommand) -> Result<(), WorkflowError> {
        let events = self.audit.handle(&command)?;
        let id = *self.audit.id();

        let record = match &command {
            AuditCommand::Start(_) => self.api.start_audit(id).await?,
            AuditCommand::SubmitForReview(cmd) => {
                let note = HistoryNote {
                    content: cmd.content.clone(),
                    files: cmd.files.clone(),
                };
                self.api.submit_for_review(id, &note).await?
            }
            AuditCommand::SendFeedback(cmd) => {
                let note = HistoryNote {
                    content: cmd.content.clone(),
                    files: cmd.files.clone(),
                };
                self.api.send_feedback(id, &note).await?
            }
            AuditCommand::Complete(_) => self.api.complete_audit(id).await?,
            AuditCommand::UpdateQuestion(cmd) => {
                self.api.update_question(id, cmd.question_id, &cmd.patch).await?
            }
            AuditCommand::EditDetails(cmd) => self.api.update_audit(id, &cmd.draft).await?,
        };

        self.audit.settle(&events, &record)?;
        Ok(())
    }
}

fn action_name(command: &AuditCommand) -> &'static str {
    match command.required_action() {
        Some(action) => action.as_str(),
        None => "update-question",
    }
}
