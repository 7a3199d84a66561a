//! Routes and route guards.

use core::fmt;
use core::str::FromStr;

use auditdesk_auth::{CapabilityTable, Page};
use auditdesk_core::{AuditId, DomainError, Role};

use crate::session::SessionReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Companies,
    Audits,
    AuditDetail(AuditId),
    Questionnaire(AuditId),
    Users,
    Reports,
    Profile,
}

impl Route {
    /// The page a route renders; `None` for the public auth screens.
    pub fn page(&self) -> Option<Page> {
        match self {
            Route::Login | Route::Register => None,
            Route::Dashboard => Some(Page::Dashboard),
            Route::Companies => Some(Page::Companies),
            Route::Audits => Some(Page::Audits),
            Route::AuditDetail(_) => Some(Page::AuditDetail),
            Route::Questionnaire(_) => Some(Page::Questionnaire),
            Route::Users => Some(Page::Users),
            Route::Reports => Some(Page::Reports),
            Route::Profile => Some(Page::Profile),
        }
    }

    pub fn is_public(&self) -> bool {
        self.page().is_none()
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Companies => "/companies".to_string(),
            Route::Audits => "/audits".to_string(),
            Route::AuditDetail(id) => format!("/audits/{id}"),
            Route::Questionnaire(id) => format!("/audits/{id}/questionnaire"),
            Route::Users => "/users".to_string(),
            Route::Reports => "/reports".to_string(),
            Route::Profile => "/profile".to_string(),
        }
    }

    fn for_page(page: Page) -> Option<Route> {
        match page {
            Page::Dashboard => Some(Route::Dashboard),
            Page::Companies => Some(Route::Companies),
            Page::Audits => Some(Route::Audits),
            Page::Users => Some(Route::Users),
            Page::Reports => Some(Route::Reports),
            Page::Profile => Some(Route::Profile),
            // Reached from an audit, not from the navigation.
            Page::AuditDetail | Page::Questionnaire => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim().trim_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            [""] | ["dashboard"] => Route::Dashboard,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["companies"] => Route::Companies,
            ["audits"] => Route::Audits,
            ["audits", id] => Route::AuditDetail(id.parse()?),
            ["audits", id, "questionnaire"] => Route::Questionnaire(id.parse()?),
            ["users"] => Route::Users,
            ["reports"] => Route::Reports,
            ["profile"] => Route::Profile,
            _ => return Err(DomainError::not_found()),
        };
        Ok(route)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Allow,
    /// Not signed in; come back to `return_to` after login.
    RedirectToLogin { return_to: Route },
    /// Signed in, but the role may not open this page.
    Forbidden,
    /// Signed-in users do not see the login and register screens.
    RedirectToDashboard,
}

pub fn guard(route: Route, session: &SessionReader) -> Guard {
    match (session.role(), route.page()) {
        (None, None) => Guard::Allow,
        (None, Some(_)) => Guard::RedirectToLogin { return_to: route },
        (Some(_), None) => Guard::RedirectToDashboard,
        (Some(role), Some(page)) => {
            if CapabilityTable::new().page_visible(role, page) {
                Guard::Allow
            } else {
                Guard::Forbidden
            }
        }
    }
}

/// Sidebar entries for `role`, in display order.
pub fn navigation(role: Role) -> Vec<Route> {
    CapabilityTable::new()
        .visible_pages(role)
        .into_iter()
        .filter_map(Route::for_page)
        .collect()
}
