use tracing::warn;

use auditdesk_client::DirectoryApi;
use auditdesk_directory::{ProfilePatch, User};

use super::{AfterSubmit, FieldErrors, Form, FormController, SubmitError};
use crate::session::SessionStore;

/// The signed-in user's own profile. Only changed fields are sent.
#[derive(Debug, Clone)]
pub struct ProfileForm {
    original: User,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileForm {
    pub fn new(user: &User) -> Self {
        Self {
            original: user.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

fn changed(value: &str, original: &str) -> Option<String> {
    let value = value.trim();
    (value != original.trim()).then(|| value.to_string())
}

impl Form for ProfileForm {
    type Payload = ProfilePatch;

    fn validate(&self) -> Result<ProfilePatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        super::required(&mut errors, "username", &self.username);
        super::email(&mut errors, "email", &self.email);
        super::finish(errors)?;

        let original = &self.original;
        Ok(ProfilePatch {
            username: changed(&self.username, &original.username),
            email: changed(&self.email, &original.email),
            phone: changed(&self.phone, original.phone.as_deref().unwrap_or_default()),
            first_name: changed(&self.first_name, &original.first_name),
            last_name: changed(&self.last_name, &original.last_name),
        })
    }

    fn after_submit(&self) -> AfterSubmit {
        AfterSubmit::CloseAndRefresh
    }
}

/// Send the changed fields, then merge them into the session.
///
/// Returns `None` when nothing changed; no request is made then. A rejected
/// write leaves the session untouched.
pub async fn save_profile(
    api: &dyn DirectoryApi,
    session: &SessionStore,
    form: &mut FormController<ProfileForm>,
) -> Result<Option<User>, SubmitError> {
    let Some(current) = session.current_user() else {
        return Err(form.deny("Please log in to continue."));
    };
    if form.values.validate().is_ok_and(|patch| patch.is_empty()) {
        return Ok(None);
    }

    let id = current.id;
    let ((saved, patch), _) = form
        .submit(|patch| async move {
            let saved = api.update_profile(id, &patch).await?;
            Ok((saved, patch))
        })
        .await?;

    if let Err(err) = session.update_user(&patch) {
        warn!(error = %err, "profile saved but the session could not be persisted");
    }
    form.values = ProfileForm::new(&saved);
    Ok(Some(saved))
}
