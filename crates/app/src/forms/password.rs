use auditdesk_client::DirectoryApi;
use auditdesk_core::UserId;
use auditdesk_directory::PasswordChange;

use super::{AfterSubmit, FieldErrors, Form, FormController, SubmitError};

#[derive(Debug, Clone, Default)]
pub struct PasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
    pub min_password_length: usize,
}

impl Form for PasswordForm {
    type Payload = PasswordChange;

    fn validate(&self) -> Result<PasswordChange, FieldErrors> {
        let mut errors = FieldErrors::new();
        super::required(&mut errors, "old_password", &self.old_password);
        super::password(&mut errors, "new_password", &self.new_password, self.min_password_length);
        if !errors.contains_key("new_password") && self.new_password == self.old_password {
            errors.insert("new_password", "The new password must differ from the current one.".to_string());
        }
        super::confirmation(&mut errors, "confirm_password", &self.new_password, &self.confirm_password);
        super::finish(errors).map(|()| PasswordChange {
            old_password: self.old_password.clone(),
            new_password: self.new_password.clone(),
        })
    }

    fn after_submit(&self) -> AfterSubmit {
        AfterSubmit::CloseAndRefresh
    }
}

pub async fn change_password(
    api: &dyn DirectoryApi,
    user: UserId,
    form: &mut FormController<PasswordForm>,
) -> Result<AfterSubmit, SubmitError> {
    let ((), after) = form
        .submit(|change| async move { api.change_password(user, &change).await })
        .await?;
    form.values = PasswordForm {
        min_password_length: form.values.min_password_length,
        ..PasswordForm::default()
    };
    Ok(after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, PASSWORD};

    fn form(old: &str, new: &str, confirm: &str) -> PasswordForm {
        PasswordForm {
            old_password: old.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
            min_password_length: 8,
        }
    }

    #[test]
    fn confirmation_and_length_are_checked() {
        let errors = form(PASSWORD, "short", "short").validate().unwrap_err();
        assert!(errors.contains_key("new_password"));

        let errors = form(PASSWORD, "long-enough", "long-enougH").validate().unwrap_err();
        assert_eq!(errors.get("confirm_password").map(String::as_str), Some("Passwords do not match."));

        let errors = form(PASSWORD, PASSWORD, PASSWORD).validate().unwrap_err();
        assert!(errors.contains_key("new_password"));
    }

    #[tokio::test]
    async fn success_clears_the_fields() {
        let backend = FakeBackend::new();
        let mut controller = FormController::new(form(PASSWORD, "long-enough", "long-enough"));
        change_password(&backend, UserId::new(1), &mut controller).await.unwrap();
        assert!(controller.values.new_password.is_empty());
        assert_eq!(controller.values.min_password_length, 8);
    }

    #[tokio::test]
    async fn wrong_current_password_is_shown() {
        let backend = FakeBackend::new();
        let mut controller = FormController::new(form("wrong-one", "long-enough", "long-enough"));
        let err = change_password(&backend, UserId::new(1), &mut controller).await.unwrap_err();
        assert_eq!(err, SubmitError::Rejected("old_password: Wrong password.".to_string()));
        assert_eq!(controller.values.old_password, "wrong-one");
    }
}
