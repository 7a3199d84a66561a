//! Forms: local validation, single in-flight submission, and what happens
//! after a successful write.
//!
//! A [`FormController`] owns the entered values. Validation failures block
//! the write and are reported per field; a rejected write keeps every value
//! and shows the collaborator's message.

pub mod audit;
pub mod company;
pub mod password;
pub mod profile;
pub mod session;
pub mod user;

use std::collections::BTreeMap;
use std::future::Future;

use thiserror::Error;
use tracing::warn;

use auditdesk_auth::{Action, Principal, Relation, Resource, authorize};
use auditdesk_client::ApiError;
use auditdesk_core::{CompanyId, DomainError, Email, Role};
use auditdesk_directory::Company;

use crate::routes::Route;
use crate::session::SessionReader;

pub use audit::{AuditForm, edit_audit, save_audit};
pub use company::{CompanyForm, save_company};
pub use password::{PasswordForm, change_password};
pub use profile::{ProfileForm, save_profile};
pub use session::{LoginForm, RegisterForm, login, register};
pub use user::{UserForm, save_user};

/// Messages keyed by field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// What the surrounding screen does after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterSubmit {
    /// Edit dialogs close and the parent list reloads.
    CloseAndRefresh,
    Navigate(Route),
}

pub trait Form {
    /// Body handed to the collaborator.
    type Payload;

    fn validate(&self) -> Result<Self::Payload, FieldErrors>;
    fn after_submit(&self) -> AfterSubmit;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Busy,

    #[error("{} field(s) are invalid", .0.len())]
    Invalid(FieldErrors),

    #[error("{0}")]
    Rejected(String),

    /// The signed-in role may not perform this write. Nothing was sent.
    #[error("{0}")]
    Forbidden(String),
}

#[derive(Debug, Clone)]
pub struct FormController<F: Form> {
    pub values: F,
    errors: FieldErrors,
    server_error: Option<String>,
    busy: bool,
}

impl<F: Form> FormController<F> {
    pub fn new(values: F) -> Self {
        Self {
            values,
            errors: FieldErrors::new(),
            server_error: None,
            busy: false,
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    /// The submit control is disabled while this is true.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Validate and mark the form busy.
    pub fn begin(&mut self) -> Result<F::Payload, SubmitError> {
        if self.busy {
            return Err(SubmitError::Busy);
        }
        match self.values.validate() {
            Ok(payload) => {
                self.errors.clear();
                self.server_error = None;
                self.busy = true;
                Ok(payload)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(SubmitError::Invalid(errors))
            }
        }
    }

    /// Record the outcome of the write started by [`FormController::begin`].
    pub fn finish<T>(&mut self, result: Result<T, String>) -> Result<(T, AfterSubmit), SubmitError> {
        self.busy = false;
        match result {
            Ok(value) => Ok((value, self.values.after_submit())),
            Err(message) => {
                warn!(error = %message, "form submission rejected");
                self.server_error = Some(message.clone());
                Err(SubmitError::Rejected(message))
            }
        }
    }

    /// Refuse the submission before anything is sent.
    pub fn deny(&mut self, message: impl Into<String>) -> SubmitError {
        let message = message.into();
        warn!(error = %message, "form submission refused");
        self.busy = false;
        self.server_error = Some(message.clone());
        SubmitError::Forbidden(message)
    }

    pub async fn submit<T, W, Fut>(&mut self, write: W) -> Result<(T, AfterSubmit), SubmitError>
    where
        W: FnOnce(F::Payload) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let payload = self.begin()?;
        let result = write(payload).await.map_err(|err| err.user_message());
        self.finish(result)
    }
}

/// The signed-in principal, if it may perform `action` on `resource`.
pub(crate) fn permit<F: Form>(
    form: &mut FormController<F>,
    session: &SessionReader,
    resource: Resource,
    action: Action,
) -> Result<Principal, SubmitError> {
    let Some(principal) = session.principal() else {
        return Err(form.deny("Please log in to continue."));
    };
    if authorize(&principal, resource, Relation::Other, action).is_err() {
        return Err(form.deny(format!(
            "Not allowed: {} may not {} {}.",
            principal.role,
            action.as_str(),
            resource.as_str()
        )));
    }
    Ok(principal)
}

pub(crate) fn required(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field, "This field is required.".to_string());
    }
}

pub(crate) fn email(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field, "This field is required.".to_string());
    } else if let Err(err) = Email::parse(value) {
        errors.insert(field, err.user_message());
    }
}

pub(crate) fn password(errors: &mut FieldErrors, field: &'static str, value: &str, min_length: usize) {
    if value.chars().count() < min_length {
        errors.insert(field, format!("Password must be at least {min_length} characters."));
    }
}

pub(crate) fn confirmation(errors: &mut FieldErrors, field: &'static str, value: &str, confirm: &str) {
    if value != confirm {
        errors.insert(field, "Passwords do not match.".to_string());
    }
}

/// Participants must belong to one of `companies`.
pub(crate) fn organization(
    errors: &mut FieldErrors,
    role: Role,
    organization: Option<CompanyId>,
    companies: &[Company],
) {
    let ok = !role.requires_organization()
        || organization.is_some_and(|org| companies.iter().any(|c| c.id == org));
    if !ok {
        errors.insert("organization", "Participants must belong to an existing company.".to_string());
    }
}

/// Attach a domain validation failure to `field` unless it already has one.
pub(crate) fn domain(errors: &mut FieldErrors, field: &'static str, result: Result<(), DomainError>) {
    if let Err(err) = result {
        errors.entry(field).or_insert_with(|| err.user_message());
    }
}

pub(crate) fn finish(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Name(String);

    impl Form for Name {
        type Payload = String;

        fn validate(&self) -> Result<String, FieldErrors> {
            let mut errors = FieldErrors::new();
            required(&mut errors, "name", &self.0);
            finish(errors).map(|()| self.0.trim().to_string())
        }

        fn after_submit(&self) -> AfterSubmit {
            AfterSubmit::CloseAndRefresh
        }
    }

    #[test]
    fn invalid_values_block_submission() {
        let mut form = FormController::new(Name("  ".to_string()));
        let err = form.begin().unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert_eq!(form.error("name"), Some("This field is required."));
        assert!(!form.is_busy());
    }

    #[test]
    fn second_submit_while_in_flight_is_refused() {
        let mut form = FormController::new(Name("Acme".to_string()));
        assert_eq!(form.begin().unwrap(), "Acme");
        assert_eq!(form.begin().unwrap_err(), SubmitError::Busy);

        let (_, after) = form.finish(Ok(())).unwrap();
        assert_eq!(after, AfterSubmit::CloseAndRefresh);
        assert!(form.begin().is_ok());
    }

    #[tokio::test]
    async fn rejected_write_keeps_values_and_shows_message() {
        let mut form = FormController::new(Name("Acme".to_string()));
        let err = form
            .submit(|_| async {
                Err::<(), _>(ApiError::Request {
                    status: 400,
                    message: "name: company with this name already exists.".to_string(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SubmitError::Rejected("name: company with this name already exists.".to_string())
        );
        assert_eq!(form.values.0, "Acme");
        assert_eq!(form.server_error(), Some("name: company with this name already exists."));
        assert!(!form.is_busy());
    }

    #[test]
    fn signed_out_callers_are_refused_before_validation() {
        let mut form = FormController::new(Name(String::new()));
        let err = permit(&mut form, &SessionReader::fixed(None), Resource::Company, Action::Create)
            .unwrap_err();
        assert_eq!(err, SubmitError::Forbidden("Please log in to continue.".to_string()));
        assert_eq!(form.server_error(), Some("Please log in to continue."));
        assert!(form.errors().is_empty());
    }
}
