use tracing::info;

use auditdesk_auth::{Action, Resource};
use auditdesk_client::DirectoryApi;
use auditdesk_core::CompanyId;
use auditdesk_directory::{Company, CompanyDraft, ContactInfo};

use super::{AfterSubmit, FieldErrors, Form, FormController, SubmitError};
use crate::session::SessionReader;

/// Create/edit dialog for a company.
#[derive(Debug, Clone, Default)]
pub struct CompanyForm {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub location: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub website: String,
    pub description: String,
    /// Set when editing an existing company.
    pub editing: Option<CompanyId>,
    /// Companies already listed, for the unique-name check.
    pub existing: Vec<Company>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl CompanyForm {
    pub fn create(existing: Vec<Company>) -> Self {
        Self {
            existing,
            ..Self::default()
        }
    }

    pub fn edit(company: &Company, existing: Vec<Company>) -> Self {
        let contact = &company.contact;
        Self {
            name: company.name.clone(),
            industry: company.industry.clone(),
            size: company.size.clone(),
            location: company.location.clone(),
            contact_name: contact.name.clone().unwrap_or_default(),
            contact_email: contact.email.clone().unwrap_or_default(),
            contact_phone: contact.phone.clone().unwrap_or_default(),
            website: contact.website.clone().unwrap_or_default(),
            description: company.description.clone(),
            editing: Some(company.id),
            existing,
        }
    }
}

impl Form for CompanyForm {
    type Payload = CompanyDraft;

    fn validate(&self) -> Result<CompanyDraft, FieldErrors> {
        let draft = CompanyDraft {
            name: self.name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            size: self.size.trim().to_string(),
            location: self.location.trim().to_string(),
            contact: ContactInfo {
                name: optional(&self.contact_name),
                email: optional(&self.contact_email),
                phone: optional(&self.contact_phone),
                website: optional(&self.website),
            },
            description: self.description.trim().to_string(),
        };

        let mut errors = FieldErrors::new();
        super::required(&mut errors, "name", &draft.name);
        if let Some(email) = &draft.contact.email {
            super::email(&mut errors, "contact_email", email);
        }
        if !errors.contains_key("name") {
            super::domain(&mut errors, "name", draft.ensure_unique_name(&self.existing, self.editing));
        }
        if errors.is_empty() {
            super::domain(&mut errors, "form", draft.validate());
        }
        super::finish(errors).map(|()| draft)
    }

    fn after_submit(&self) -> AfterSubmit {
        AfterSubmit::CloseAndRefresh
    }
}

/// Create or update the company, depending on how the form was opened.
/// Admin only.
pub async fn save_company(
    api: &dyn DirectoryApi,
    session: &SessionReader,
    form: &mut FormController<CompanyForm>,
) -> Result<(Company, AfterSubmit), SubmitError> {
    let editing = form.values.editing;
    let action = if editing.is_some() { Action::Update } else { Action::Create };
    let principal = super::permit(form, session, Resource::Company, action)?;

    let saved = form
        .submit(|draft| async move {
            match editing {
                Some(id) => api.update_company(id, &draft).await,
                None => api.create_company(&draft).await,
            }
        })
        .await?;
    info!(company_id = %saved.0.id, by = %principal.user_id, action = action.as_str(), "company saved");
    Ok(saved)
}
