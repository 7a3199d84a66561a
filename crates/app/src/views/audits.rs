use chrono::NaiveDate;

use auditdesk_audits::AuditRecord;
use auditdesk_auth::Page;
use auditdesk_client::{AuditApi, AuditQuery};
use auditdesk_core::{AuditStatus, CompanyId, UserId};

use super::query::{Listable, SortDirection, SortKey, SortState, contains_folded};
use super::{ListView, LoadError, admit};
use crate::session::SessionReader;

pub type AuditsView = ListView<AuditRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditField {
    Name,
    Company,
    Status,
    Completion,
    StartDate,
    EndDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub status: Option<AuditStatus>,
    pub company: Option<CompanyId>,
    pub expert: Option<UserId>,
}

impl Listable for AuditRecord {
    type Field = AuditField;
    type Filter = AuditFilter;

    fn matches_search(&self, needle: &str) -> bool {
        contains_folded(&self.name, needle)
            || self.company_name.as_deref().is_some_and(|n| contains_folded(n, needle))
    }

    fn matches_filter(&self, filter: &AuditFilter) -> bool {
        filter.status.is_none_or(|s| self.status == s)
            && filter.company.is_none_or(|c| self.company == c)
            && filter.expert.is_none_or(|e| self.expert == Some(e))
    }

    fn list_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    fn sort_key(&self, field: AuditField) -> SortKey {
        match field {
            AuditField::Name => SortKey::Text(self.name.clone()),
            AuditField::Company => SortKey::Text(
                self.company_name
                    .clone()
                    .unwrap_or_else(|| self.company.to_string()),
            ),
            AuditField::Status => SortKey::Number(match self.status {
                AuditStatus::Planned => 0,
                AuditStatus::InProgress => 1,
                AuditStatus::Completed => 2,
            }),
            AuditField::Completion => SortKey::Number(i64::from(self.completion_clamped())),
            AuditField::StartDate => SortKey::Date(self.start_date),
            AuditField::EndDate => SortKey::Date(self.end_date),
        }
    }
}

/// Fetch audits, newest start date first. `query` narrows the fetch on the
/// server; the view still applies its own client-side pipeline.
pub async fn load_audits(
    api: &dyn AuditApi,
    session: &SessionReader,
    query: &AuditQuery,
) -> Result<AuditsView, LoadError> {
    let principal = admit(session, Page::Audits)?;
    let rows = api.list_audits(query).await?;
    Ok(ListView::new(
        &principal,
        rows,
        SortState::new(AuditField::StartDate, SortDirection::Descending),
    ))
}
