//! Login and self-registration.

use tracing::warn;

use auditdesk_client::DirectoryApi;
use auditdesk_core::{CompanyId, Role};
use auditdesk_directory::{Company, Credentials, User, UserDraft};

use super::{AfterSubmit, FieldErrors, Form, FormController, SubmitError};
use crate::routes::Route;
use crate::session::SessionStore;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Where the guard sent the user from.
    pub return_to: Option<Route>,
}

impl Form for LoginForm {
    type Payload = Credentials;

    fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        super::required(&mut errors, "username", &self.username);
        if self.password.is_empty() {
            errors.insert("password", "This field is required.".to_string());
        }
        super::finish(errors).map(|()| Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }

    fn after_submit(&self) -> AfterSubmit {
        AfterSubmit::Navigate(self.return_to.filter(|r| !r.is_public()).unwrap_or(Route::Dashboard))
    }
}

/// Authenticate and store the identity in the session.
pub async fn login(
    api: &dyn DirectoryApi,
    session: &SessionStore,
    form: &mut FormController<LoginForm>,
) -> Result<(User, AfterSubmit), SubmitError> {
    let (user, after) = form
        .submit(|credentials| async move { api.login(&credentials).await })
        .await?;
    if let Err(err) = session.login(user.clone()) {
        warn!(error = %err, "signed in, but the session will not survive a restart");
    }
    form.values.password.clear();
    Ok((user, after))
}

/// Public sign-up. Administrators are created by other administrators.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub organization: Option<CompanyId>,
    pub companies: Vec<Company>,
    pub min_password_length: usize,
}

impl RegisterForm {
    pub fn new(companies: Vec<Company>, min_password_length: usize) -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            role: Role::Participant,
            organization: None,
            companies,
            min_password_length,
        }
    }
}

impl Form for RegisterForm {
    type Payload = UserDraft;

    fn validate(&self) -> Result<UserDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        super::required(&mut errors, "username", &self.username);
        super::email(&mut errors, "email", &self.email);
        super::password(&mut errors, "password", &self.password, self.min_password_length);
        super::confirmation(&mut errors, "confirm_password", &self.password, &self.confirm_password);
        if self.role == Role::Admin {
            errors.insert("role", "Choose expert or participant.".to_string());
        }

        let draft = UserDraft {
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            organization: self.organization,
            phone: None,
            password: Some(self.password.clone()),
        };
        super::organization(&mut errors, self.role, self.organization, &self.companies);
        super::finish(errors)?;
        draft.validated(&self.companies).map_err(|err| {
            FieldErrors::from([("form", err.user_message())])
        })
    }

    fn after_submit(&self) -> AfterSubmit {
        AfterSubmit::Navigate(Route::Login)
    }
}

pub async fn register(
    api: &dyn DirectoryApi,
    form: &mut FormController<RegisterForm>,
) -> Result<(User, AfterSubmit), SubmitError> {
    form.submit(|draft| async move { api.create_user(&draft).await }).await
}
