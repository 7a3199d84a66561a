use tracing::info;

use auditdesk_auth::{Action, Resource};
use auditdesk_client::DirectoryApi;
use auditdesk_core::{CompanyId, Role, UserId};
use auditdesk_directory::{Company, User, UserDraft};

use super::{AfterSubmit, FieldErrors, Form, FormController, SubmitError};
use crate::session::SessionReader;

/// Admin dialog for creating or editing an account.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub organization: Option<CompanyId>,
    pub phone: String,
    /// Only asked for on creation.
    pub password: String,
    pub editing: Option<UserId>,
    pub companies: Vec<Company>,
    pub min_password_length: usize,
}

impl UserForm {
    pub fn create(companies: Vec<Company>, min_password_length: usize) -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            role: Role::Participant,
            organization: None,
            phone: String::new(),
            password: String::new(),
            editing: None,
            companies,
            min_password_length,
        }
    }

    pub fn edit(user: &User, companies: Vec<Company>, min_password_length: usize) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            organization: user.organization,
            phone: user.phone.clone().unwrap_or_default(),
            password: String::new(),
            editing: Some(user.id),
            companies,
            min_password_length,
        }
    }
}

impl Form for UserForm {
    type Payload = UserDraft;

    fn validate(&self) -> Result<UserDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        super::required(&mut errors, "username", &self.username);
        super::email(&mut errors, "email", &self.email);
        if self.editing.is_none() {
            super::password(&mut errors, "password", &self.password, self.min_password_length);
        }

        let phone = self.phone.trim();
        let draft = UserDraft {
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            organization: self.organization,
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            password: self.editing.is_none().then(|| self.password.clone()),
        };
        super::organization(&mut errors, self.role, self.organization, &self.companies);
        super::finish(errors)?;

        draft.validated(&self.companies).map_err(|err| {
            FieldErrors::from([("form", err.user_message())])
        })
    }

    fn after_submit(&self) -> AfterSubmit {
        AfterSubmit::CloseAndRefresh
    }
}

/// Admin only, including for one's own account: self-service edits go
/// through the profile form, which cannot change role or organization.
pub async fn save_user(
    api: &dyn DirectoryApi,
    session: &SessionReader,
    form: &mut FormController<UserForm>,
) -> Result<(User, AfterSubmit), SubmitError> {
    let editing = form.values.editing;
    let action = if editing.is_some() { Action::Update } else { Action::Create };
    let principal = super::permit(form, session, Resource::User, action)?;

    let saved = form
        .submit(|draft| async move {
            match editing {
                Some(id) => api.update_user(id, &draft).await,
                None => api.create_user(&draft).await,
            }
        })
        .await?;
    info!(user_id = %saved.0.id, by = %principal.user_id, action = action.as_str(), "user saved");
    Ok(saved)
}
