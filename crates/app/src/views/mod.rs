//! List views (companies, audits, users) and the dashboard summary.

pub mod audits;
pub mod companies;
pub mod dashboard;
pub mod query;
pub mod users;

#[cfg(test)]
mod properties;

use thiserror::Error;

use auditdesk_auth::{
    Action, AuthzError, Page, Principal, Relation, Resource, Scope, authorize, authorize_page,
};
use auditdesk_client::ApiError;
use auditdesk_core::Entity;

use crate::session::SessionReader;

pub use audits::{AuditField, AuditFilter, AuditsView};
pub use companies::{CompaniesView, CompanyField, CompanyFilter, delete_company};
pub use dashboard::DashboardSummary;
pub use query::{DateRange, ListQuery, Listable, SortDirection, SortKey, SortState};
pub use users::{UserField, UserFilter, UsersView, delete_user};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("page {0:?} is not available to this role")]
    Forbidden(Page),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl LoadError {
    pub fn user_message(&self) -> String {
        match self {
            LoadError::NotSignedIn => "Please log in to continue.".to_string(),
            LoadError::Forbidden(_) => "You do not have access to this page.".to_string(),
            LoadError::Api(err) => err.user_message(),
        }
    }
}

/// A delete issued from a list screen.
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl DeleteError {
    pub fn user_message(&self) -> String {
        match self {
            DeleteError::NotSignedIn => "Please log in to continue.".to_string(),
            DeleteError::Forbidden(_) => "Only administrators can delete records.".to_string(),
            DeleteError::Api(err) => err.user_message(),
        }
    }
}

/// Principal allowed to delete a `resource`.
pub(crate) fn admit_delete(session: &SessionReader, resource: Resource) -> Result<Principal, DeleteError> {
    let principal = session.principal().ok_or(DeleteError::NotSignedIn)?;
    authorize(&principal, resource, Relation::Other, Action::Delete)?;
    Ok(principal)
}

/// A 404 on delete means someone else got there first; the row goes either way.
pub(crate) fn already_gone(result: Result<(), ApiError>) -> Result<(), DeleteError> {
    match result {
        Err(err) if err.is_not_found() => {
            tracing::warn!("record was already deleted on the server");
            Ok(())
        }
        other => other.map_err(DeleteError::from),
    }
}

/// Principal allowed to open `page`, or why not.
pub(crate) fn admit(session: &SessionReader, page: Page) -> Result<Principal, LoadError> {
    let principal = session.principal().ok_or(LoadError::NotSignedIn)?;
    authorize_page(principal.role, page).map_err(|_| LoadError::Forbidden(page))?;
    Ok(principal)
}

/// Rows plus the query state of one list screen.
///
/// [`ListView::visible`] recomputes from scratch on every call.
#[derive(Debug, Clone)]
pub struct ListView<T: Listable> {
    rows: Vec<T>,
    scope: Scope,
    pub query: ListQuery<T>,
    default_direction: SortDirection,
}

impl<T: Listable> ListView<T> {
    pub fn new(principal: &Principal, rows: Vec<T>, sort: SortState<T::Field>) -> Self {
        Self {
            rows,
            scope: Scope::for_principal(principal),
            default_direction: sort.direction,
            query: ListQuery::new(sort),
        }
    }

    pub fn visible(&self) -> Vec<&T> {
        self.query.apply(&self.scope, &self.rows)
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_filter(&mut self, filter: T::Filter) {
        self.query.filter = filter;
    }

    pub fn set_dates(&mut self, dates: DateRange) {
        self.query.dates = dates;
    }

    pub fn click_sort(&mut self, field: T::Field) {
        self.query.sort.click(field, self.default_direction);
    }

}

impl<T: Listable + Entity> ListView<T> {
    /// Insert or replace a row after a successful create or edit.
    pub fn upsert(&mut self, row: T) {
        auditdesk_core::entity::upsert(&mut self.rows, row);
    }

    pub fn remove(&mut self, id: T::Id) {
        self.rows.retain(|r| r.id() != id);
    }
}
