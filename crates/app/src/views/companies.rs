use chrono::NaiveDate;

use tracing::info;

use auditdesk_auth::{Page, Resource};
use auditdesk_client::DirectoryApi;
use auditdesk_core::CompanyId;
use auditdesk_directory::Company;

use super::query::{Listable, SortDirection, SortKey, SortState, contains_folded};
use super::{DeleteError, ListView, LoadError, admit, admit_delete, already_gone};
use crate::session::SessionReader;

pub type CompaniesView = ListView<Company>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyField {
    Name,
    Industry,
    Size,
    Location,
    CreatedAt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub industry: Option<String>,
    pub size: Option<String>,
}

fn same_label(value: &str, wanted: &Option<String>) -> bool {
    wanted
        .as_deref()
        .is_none_or(|w| value.trim().to_lowercase() == w.trim().to_lowercase())
}

impl Listable for Company {
    type Field = CompanyField;
    type Filter = CompanyFilter;

    fn matches_search(&self, needle: &str) -> bool {
        contains_folded(&self.name, needle)
            || contains_folded(&self.industry, needle)
            || contains_folded(&self.location, needle)
            || self.contact.name.as_deref().is_some_and(|n| contains_folded(n, needle))
            || self.contact.email.as_deref().is_some_and(|e| contains_folded(e, needle))
    }

    fn matches_filter(&self, filter: &CompanyFilter) -> bool {
        same_label(&self.industry, &filter.industry) && same_label(&self.size, &filter.size)
    }

    fn list_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|at| at.date_naive())
    }

    fn sort_key(&self, field: CompanyField) -> SortKey {
        match field {
            CompanyField::Name => SortKey::Text(self.name.clone()),
            CompanyField::Industry => SortKey::Text(self.industry.clone()),
            CompanyField::Size => SortKey::Text(self.size.clone()),
            CompanyField::Location => SortKey::Text(self.location.clone()),
            CompanyField::CreatedAt => SortKey::Date(self.list_date()),
        }
    }
}

/// Fetch companies for the Companies page, sorted by name.
pub async fn load_companies(
    api: &dyn DirectoryApi,
    session: &SessionReader,
) -> Result<CompaniesView, LoadError> {
    let principal = admit(session, Page::Companies)?;
    let rows = api.list_companies().await?;
    Ok(ListView::new(
        &principal,
        rows,
        SortState::new(CompanyField::Name, SortDirection::Ascending),
    ))
}

/// Delete a company (admin only) and drop its row from `view`.
pub async fn delete_company(
    api: &dyn DirectoryApi,
    session: &SessionReader,
    view: &mut CompaniesView,
    id: CompanyId,
) -> Result<(), DeleteError> {
    let principal = admit_delete(session, Resource::Company)?;
    already_gone(api.delete_company(id).await)?;
    view.remove(id);
    info!(company_id = %id, by = %principal.user_id, "company deleted");
    Ok(())
}
