use chrono::NaiveDate;

use tracing::info;

use auditdesk_auth::{Page, Resource};
use auditdesk_client::DirectoryApi;
use auditdesk_core::{CompanyId, Role, UserId};
use auditdesk_directory::User;

use super::query::{Listable, SortDirection, SortKey, SortState, contains_folded};
use super::{DeleteError, ListView, LoadError, admit, admit_delete, already_gone};
use crate::session::SessionReader;

pub type UsersView = ListView<User>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Username,
    Email,
    Role,
    DateJoined,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub organization: Option<CompanyId>,
}

impl Listable for User {
    type Field = UserField;
    type Filter = UserFilter;

    fn matches_search(&self, needle: &str) -> bool {
        contains_folded(&self.username, needle)
            || contains_folded(&self.email, needle)
            || contains_folded(&self.display_name(), needle)
    }

    fn matches_filter(&self, filter: &UserFilter) -> bool {
        filter.role.is_none_or(|r| self.role == r)
            && filter.organization.is_none_or(|o| self.organization == Some(o))
    }

    fn list_date(&self) -> Option<NaiveDate> {
        self.date_joined.map(|at| at.date_naive())
    }

    fn sort_key(&self, field: UserField) -> SortKey {
        match field {
            UserField::Username => SortKey::Text(self.username.clone()),
            UserField::Email => SortKey::Text(self.email.clone()),
            UserField::Role => SortKey::Text(self.role.as_str().to_string()),
            UserField::DateJoined => SortKey::Date(self.list_date()),
        }
    }
}

/// Fetch users for the admin-only Users page.
pub async fn load_users(api: &dyn DirectoryApi, session: &SessionReader) -> Result<UsersView, LoadError> {
    let principal = admit(session, Page::Users)?;
    let rows = api.list_users().await?;
    Ok(ListView::new(
        &principal,
        rows,
        SortState::new(UserField::Username, SortDirection::Ascending),
    ))
}

/// Delete an account (admin only) and drop its row from `view`.
pub async fn delete_user(
    api: &dyn DirectoryApi,
    session: &SessionReader,
    view: &mut UsersView,
    id: UserId,
) -> Result<(), DeleteError> {
    let principal = admit_delete(session, Resource::User)?;
    already_gone(api.delete_user(id).await)?;
    view.remove(id);
    info!(user_id = %id, by = %principal.user_id, "user deleted");
    Ok(())
}
