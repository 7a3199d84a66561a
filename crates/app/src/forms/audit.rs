use chrono::NaiveDate;
use tracing::info;

use auditdesk_audits::{AuditDraft, AuditRecord};
use auditdesk_auth::{Action, AuditAction, Resource};
use auditdesk_client::AuditApi;
use auditdesk_core::{AggregateRoot, CompanyId, DomainError, UserId};

use super::{AfterSubmit, FieldErrors, Form, FormController, SubmitError};
use crate::lifecycle::{AuditWorkflow, WorkflowError};
use crate::session::SessionReader;

/// Audit creation dialog; also reused to edit the planning fields through
/// [`edit_audit`].
#[derive(Debug, Clone, Default)]
pub struct AuditForm {
    pub name: String,
    pub company: Option<CompanyId>,
    pub expert: Option<UserId>,
    pub participant: Option<UserId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AuditForm {
    pub fn edit(record: &AuditRecord) -> Self {
        Self {
            name: record.name.clone(),
            company: Some(record.company),
            expert: record.expert,
            participant: record.participant,
            start_date: record.start_date,
            end_date: record.end_date,
        }
    }
}

impl Form for AuditForm {
    type Payload = AuditDraft;

    fn validate(&self) -> Result<AuditDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        super::required(&mut errors, "name", &self.name);
        if self.company.is_none() {
            errors.insert("company", "Select a company.".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.insert("end_date", "End date must not be before the start date.".to_string());
            }
        }
        let Some(company) = self.company else {
            return Err(errors);
        };
        super::finish(errors)?;

        let draft = AuditDraft {
            name: self.name.trim().to_string(),
            company,
            expert: self.expert,
            participant: self.participant,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        let mut errors = FieldErrors::new();
        super::domain(&mut errors, "form", draft.validate());
        super::finish(errors).map(|()| draft)
    }

    fn after_submit(&self) -> AfterSubmit {
        AfterSubmit::CloseAndRefresh
    }
}

/// Create a new audit. Experts and admins only.
pub async fn save_audit(
    api: &dyn AuditApi,
    session: &SessionReader,
    form: &mut FormController<AuditForm>,
) -> Result<(AuditRecord, AfterSubmit), SubmitError> {
    let principal = super::permit(form, session, Resource::Audit, Action::Create)?;
    let saved = form
        .submit(|draft| async move { api.create_audit(&draft).await })
        .await?;
    info!(audit_id = %saved.0.id, by = %principal.user_id, "audit created");
    Ok(saved)
}

/// Save the planning fields of an open audit.
///
/// Goes through the lifecycle view model, so the status/role gate and the
/// fixed company apply exactly as for any other audit action.
pub async fn edit_audit(
    workflow: &mut AuditWorkflow,
    form: &mut FormController<AuditForm>,
) -> Result<(AuditRecord, AfterSubmit), SubmitError> {
    if !workflow.available_actions().contains(&AuditAction::Edit) {
        let message = match workflow.explain(AuditAction::Edit) {
            Some(explanation) => format!("Not allowed: {}", explanation.reason),
            None => "Please log in to continue.".to_string(),
        };
        return Err(form.deny(message));
    }

    let draft = form.begin()?;
    match workflow.edit(draft).await {
        Ok(()) => {
            info!(audit_id = %workflow.audit().id(), "audit details edited");
            form.finish(Ok(workflow.snapshot()))
        }
        Err(WorkflowError::Domain(DomainError::Unauthorized(message))) => {
            Err(form.deny(format!("Not allowed: {message}")))
        }
        Err(err) => form.finish(Err(err.user_message())),
    }
}
